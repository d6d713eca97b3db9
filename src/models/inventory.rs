// src/models/inventory.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- 1. Espécies de item ---
// Três ledgers distintos partilham um espaço de ids sem namespace; a
// espécie é a tag que desambigua uma referência. Sempre que o chamador
// conhece a espécie, ela viaja junto (ver ResolvedItem); a sondagem em
// ordem fixa fica só como fallback para ids legados sem dica.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "item_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Apparel,
    Supply,
    GenItem,
}

impl ItemKind {
    /// Normaliza as dicas de espécie que chegam do cliente. Os sistemas
    /// antigos usavam vários apelidos para o mesmo ledger.
    pub fn from_hint(hint: &str) -> Option<ItemKind> {
        match hint.trim().to_ascii_lowercase().as_str() {
            "apparel" => Some(ItemKind::Apparel),
            "supply" | "admin-supply" | "admin_supply" | "adminsupply" => Some(ItemKind::Supply),
            "genitem" | "gen_item" | "gen-item" | "it" | "maintenance" => Some(ItemKind::GenItem),
            _ => None,
        }
    }

    /// Fardamento e itens gerais têm rastreio por unidade; material de
    /// expediente é contado só em quantidade.
    pub fn tracks_units(&self) -> bool {
        matches!(self, ItemKind::Apparel | ItemKind::GenItem)
    }
}

// --- 2. Ledgers de inventário (um por espécie) ---
// total_quantity é a única fonte de verdade do "quantos existem nesta sala
// para esta variante exata"; só é mutado dentro de transação com row lock.

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApparelInventory {
    pub id: Uuid,
    pub room_id: Uuid,
    pub apparel_type: String,
    pub apparel_for: String,
    pub size: String,
    pub total_quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SupplyInventory {
    pub id: Uuid,
    pub room_id: Uuid,
    pub supply_name: String,
    pub supply_type: String,
    pub total_quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenItemInventory {
    pub id: Uuid,
    pub room_id: Uuid,
    pub item_name: String,
    pub item_type: String,
    pub total_quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- 3. Referência resolvida (união etiquetada por espécie) ---
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase", tag = "kind", content = "inventory")]
pub enum ResolvedItem {
    Apparel(ApparelInventory),
    Supply(SupplyInventory),
    GenItem(GenItemInventory),
}

impl ResolvedItem {
    pub fn kind(&self) -> ItemKind {
        match self {
            ResolvedItem::Apparel(_) => ItemKind::Apparel,
            ResolvedItem::Supply(_) => ItemKind::Supply,
            ResolvedItem::GenItem(_) => ItemKind::GenItem,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            ResolvedItem::Apparel(row) => row.id,
            ResolvedItem::Supply(row) => row.id,
            ResolvedItem::GenItem(row) => row.id,
        }
    }

    pub fn room_id(&self) -> Uuid {
        match self {
            ResolvedItem::Apparel(row) => row.room_id,
            ResolvedItem::Supply(row) => row.room_id,
            ResolvedItem::GenItem(row) => row.room_id,
        }
    }

    pub fn total_quantity(&self) -> i32 {
        match self {
            ResolvedItem::Apparel(row) => row.total_quantity,
            ResolvedItem::Supply(row) => row.total_quantity,
            ResolvedItem::GenItem(row) => row.total_quantity,
        }
    }

    /// Nome legível da variante, usado nos registros de atividade.
    pub fn display_name(&self) -> String {
        match self {
            ResolvedItem::Apparel(row) => {
                format!("{} ({}, {})", row.apparel_type, row.apparel_for, row.size)
            }
            ResolvedItem::Supply(row) => format!("{} ({})", row.supply_name, row.supply_type),
            ResolvedItem::GenItem(row) => format!("{} ({})", row.item_name, row.item_type),
        }
    }
}

/// Atributos que definem o tipo de uma variante; é a chave natural do
/// find-or-create de cada ledger. Usado na entrada de estoque (intake).
#[derive(Debug, Clone)]
pub enum VariantSpec {
    Apparel {
        apparel_type: String,
        apparel_for: String,
        size: String,
    },
    Supply {
        supply_name: String,
        supply_type: String,
    },
    GenItem {
        item_name: String,
        item_type: String,
    },
}

impl VariantSpec {
    pub fn kind(&self) -> ItemKind {
        match self {
            VariantSpec::Apparel { .. } => ItemKind::Apparel,
            VariantSpec::Supply { .. } => ItemKind::Supply,
            VariantSpec::GenItem { .. } => ItemKind::GenItem,
        }
    }
}

// --- 4. Recibos de entrada ---
// Registro imutável de um evento de entrada; sempre emparelhado com a
// criação/incremento de exatamente um registro de inventário.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptBatch {
    pub id: Uuid,
    pub item_kind: ItemKind,
    pub inventory_id: Uuid,
    pub room_id: Uuid,
    pub delivered_by: String,
    pub source: Option<String>,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "unit_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UnitStatus {
    InStock,
    Released,
    Lost,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchUnit {
    pub id: Uuid,
    pub batch_id: Uuid,
    pub status: UnitStatus,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dicas_de_especie_reconhecem_sinonimos() {
        assert_eq!(ItemKind::from_hint("apparel"), Some(ItemKind::Apparel));
        assert_eq!(ItemKind::from_hint("supply"), Some(ItemKind::Supply));
        assert_eq!(ItemKind::from_hint("admin-supply"), Some(ItemKind::Supply));
        assert_eq!(ItemKind::from_hint("admin_supply"), Some(ItemKind::Supply));
        assert_eq!(ItemKind::from_hint("genItem"), Some(ItemKind::GenItem));
        assert_eq!(ItemKind::from_hint("it"), Some(ItemKind::GenItem));
        assert_eq!(ItemKind::from_hint("maintenance"), Some(ItemKind::GenItem));
        assert_eq!(ItemKind::from_hint("  Apparel "), Some(ItemKind::Apparel));
        assert_eq!(ItemKind::from_hint("mobiliario"), None);
    }

    #[test]
    fn rastreio_por_unidade_por_especie() {
        assert!(ItemKind::Apparel.tracks_units());
        assert!(ItemKind::GenItem.tracks_units());
        assert!(!ItemKind::Supply.tracks_units());
    }
}
