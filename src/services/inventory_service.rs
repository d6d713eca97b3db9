// src/services/inventory_service.rs

use sqlx::{Executor, PgConnection, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{InventoryRepository, RoomRepository},
    models::{
        auth::Actor,
        inventory::{ItemKind, ReceiptBatch, ResolvedItem, VariantSpec},
    },
    services::activity_service::ActivityService,
};

#[derive(Clone)]
pub struct InventoryService {
    inventory_repo: InventoryRepository,
    room_repo: RoomRepository,
    activity: ActivityService,
}

impl InventoryService {
    pub fn new(
        inventory_repo: InventoryRepository,
        room_repo: RoomRepository,
        activity: ActivityService,
    ) -> Self {
        Self {
            inventory_repo,
            room_repo,
            activity,
        }
    }

    /// Resolve um id opaco de item. A dica de espécie (quando o cliente a
    /// envia) é normalizada e sondada primeiro; sem dica, vale a ordem fixa
    /// fardamento -> material -> item geral, e por fim as unidades.
    pub async fn resolve(
        &self,
        conn: &mut PgConnection,
        item_id: Uuid,
        hint: Option<&str>,
        for_update: bool,
    ) -> Result<Option<ResolvedItem>, AppError> {
        let kind_hint = hint.and_then(ItemKind::from_hint);
        self.inventory_repo
            .resolve(conn, item_id, kind_hint, for_update)
            .await
    }

    /// Como `resolve`, restrito a uma sala (verificação de posse).
    pub async fn resolve_in_room(
        &self,
        conn: &mut PgConnection,
        item_id: Uuid,
        room_id: Uuid,
        hint: Option<&str>,
        for_update: bool,
    ) -> Result<Option<ResolvedItem>, AppError> {
        let kind_hint = hint.and_then(ItemKind::from_hint);
        self.inventory_repo
            .resolve_in_room(conn, item_id, room_id, kind_hint, for_update)
            .await
    }

    /// Verificação de posse fora de transação: o item existe nesta sala?
    pub async fn find_in_room(
        &self,
        item_id: Uuid,
        room_id: Uuid,
        hint: Option<&str>,
    ) -> Result<Option<ResolvedItem>, AppError> {
        let kind_hint = hint.and_then(ItemKind::from_hint);
        self.inventory_repo
            .resolve_in_room_from_pool(item_id, room_id, kind_hint)
            .await
    }

    /// Debita uma linha já resolvida (e travada pelo chamador).
    pub async fn debit_resolved<'e, E>(
        &self,
        executor: E,
        item: &ResolvedItem,
        quantity: i32,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.inventory_repo
            .debit_by_id(executor, item.kind(), item.id(), quantity)
            .await
    }

    /// Credita de volta uma linha já resolvida (devolução de empréstimo).
    pub async fn credit_resolved<'e, E>(
        &self,
        executor: E,
        item: &ResolvedItem,
        quantity: i32,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.inventory_repo
            .credit_by_id(executor, item.kind(), item.id(), quantity)
            .await
    }

    /// Find-or-create da mesma variante numa sala de destino, com crédito.
    pub async fn credit_matching<'e, E>(
        &self,
        executor: E,
        source: &ResolvedItem,
        dest_room_id: Uuid,
        quantity: i32,
    ) -> Result<ResolvedItem, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.inventory_repo
            .credit_matching(executor, source, dest_room_id, quantity)
            .await
    }

    /// Lote de entrada + linhas por unidade (quando a espécie rastreia),
    /// dentro da transação do chamador.
    pub async fn record_receipt(
        &self,
        conn: &mut PgConnection,
        item: &ResolvedItem,
        room_id: Uuid,
        delivered_by: &str,
        source: Option<&str>,
        quantity: i32,
    ) -> Result<ReceiptBatch, AppError> {
        let batch = self
            .inventory_repo
            .create_receipt_batch(
                &mut *conn,
                item.kind(),
                item.id(),
                room_id,
                delivered_by,
                source,
                quantity,
            )
            .await?;
        if item.kind().tracks_units() {
            self.inventory_repo
                .create_batch_units(&mut *conn, batch.id, quantity)
                .await?;
        }
        Ok(batch)
    }

    // --- ENTRADA DE ESTOQUE (intake) ---
    // Primeira entrada de uma variante numa sala cria o registro do ledger;
    // as seguintes incrementam. Sempre emparelhada com um lote imutável e,
    // para as espécies rastreadas, com as linhas por unidade.
    pub async fn receive_stock(
        &self,
        pool: &PgPool,
        actor: Actor,
        room_id: Uuid,
        variant: VariantSpec,
        quantity: i32,
        delivered_by: &str,
        source: Option<&str>,
    ) -> Result<(ResolvedItem, ReceiptBatch), AppError> {
        self.room_repo
            .get_room_from_pool(room_id)
            .await?
            .ok_or(AppError::NotFound("Sala"))?;

        let mut tx = pool.begin().await?;

        let credited = match &variant {
            VariantSpec::Apparel {
                apparel_type,
                apparel_for,
                size,
            } => ResolvedItem::Apparel(
                self.inventory_repo
                    .credit_apparel(&mut *tx, room_id, apparel_type, apparel_for, size, quantity)
                    .await?,
            ),
            VariantSpec::Supply {
                supply_name,
                supply_type,
            } => ResolvedItem::Supply(
                self.inventory_repo
                    .credit_supply(&mut *tx, room_id, supply_name, supply_type, quantity)
                    .await?,
            ),
            VariantSpec::GenItem {
                item_name,
                item_type,
            } => ResolvedItem::GenItem(
                self.inventory_repo
                    .credit_gen_item(&mut *tx, room_id, item_name, item_type, quantity)
                    .await?,
            ),
        };

        let batch = self
            .record_receipt(&mut tx, &credited, room_id, delivered_by, source, quantity)
            .await?;

        tx.commit().await?;

        self.activity
            .log(
                actor.id,
                "STOCK_RECEIVED",
                &format!(
                    "Entrada de {} x {} na sala {}",
                    quantity,
                    credited.display_name(),
                    room_id
                ),
            )
            .await;

        Ok((credited, batch))
    }
}
