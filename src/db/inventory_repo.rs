// src/db/inventory_repo.rs

use sqlx::{Executor, PgConnection, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::inventory::{
        ApparelInventory, GenItemInventory, ItemKind, ReceiptBatch, ResolvedItem, SupplyInventory,
    },
};

// A ordem fixa de sondagem quando não há dica de espécie. Ids não têm
// namespace por espécie; uma colisão entre ledgers resolve por esta
// prioridade (ambiguidade conhecida e documentada, nada de "esperteza").
const PROBE_ORDER: [ItemKind; 3] = [ItemKind::Apparel, ItemKind::Supply, ItemKind::GenItem];

#[derive(Clone)]
pub struct InventoryRepository {
    pool: PgPool,
}

impl InventoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Sondagem por espécie (leitura simples e com lock)
    // ---
    // Os métodos de lock são usados dentro das transições que mutam o
    // ledger; o SELECT ... FOR UPDATE serializa débitos concorrentes na
    // mesma variante.

    pub async fn get_apparel<'e, E>(
        &self,
        executor: E,
        id: Uuid,
    ) -> Result<Option<ApparelInventory>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, ApparelInventory>(
            "SELECT * FROM apparel_inventories WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(row)
    }

    pub async fn get_apparel_for_update(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
    ) -> Result<Option<ApparelInventory>, AppError> {
        let row = sqlx::query_as::<_, ApparelInventory>(
            "SELECT * FROM apparel_inventories WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(conn)
        .await?;
        Ok(row)
    }

    pub async fn get_supply<'e, E>(
        &self,
        executor: E,
        id: Uuid,
    ) -> Result<Option<SupplyInventory>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row =
            sqlx::query_as::<_, SupplyInventory>("SELECT * FROM supply_inventories WHERE id = $1")
                .bind(id)
                .fetch_optional(executor)
                .await?;
        Ok(row)
    }

    pub async fn get_supply_for_update(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
    ) -> Result<Option<SupplyInventory>, AppError> {
        let row = sqlx::query_as::<_, SupplyInventory>(
            "SELECT * FROM supply_inventories WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(conn)
        .await?;
        Ok(row)
    }

    pub async fn get_gen_item<'e, E>(
        &self,
        executor: E,
        id: Uuid,
    ) -> Result<Option<GenItemInventory>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, GenItemInventory>(
            "SELECT * FROM gen_item_inventories WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(row)
    }

    pub async fn get_gen_item_for_update(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
    ) -> Result<Option<GenItemInventory>, AppError> {
        let row = sqlx::query_as::<_, GenItemInventory>(
            "SELECT * FROM gen_item_inventories WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(conn)
        .await?;
        Ok(row)
    }

    async fn get_kind(
        &self,
        conn: &mut PgConnection,
        kind: ItemKind,
        id: Uuid,
        for_update: bool,
    ) -> Result<Option<ResolvedItem>, AppError> {
        let found = match kind {
            ItemKind::Apparel => {
                let row = if for_update {
                    self.get_apparel_for_update(conn, id).await?
                } else {
                    self.get_apparel(&mut *conn, id).await?
                };
                row.map(ResolvedItem::Apparel)
            }
            ItemKind::Supply => {
                let row = if for_update {
                    self.get_supply_for_update(conn, id).await?
                } else {
                    self.get_supply(&mut *conn, id).await?
                };
                row.map(ResolvedItem::Supply)
            }
            ItemKind::GenItem => {
                let row = if for_update {
                    self.get_gen_item_for_update(conn, id).await?
                } else {
                    self.get_gen_item(&mut *conn, id).await?
                };
                row.map(ResolvedItem::GenItem)
            }
        };
        Ok(found)
    }

    async fn get_kind_in_room(
        &self,
        conn: &mut PgConnection,
        kind: ItemKind,
        id: Uuid,
        room_id: Uuid,
        for_update: bool,
    ) -> Result<Option<ResolvedItem>, AppError> {
        let table = kind_table(kind);
        let suffix = if for_update { " FOR UPDATE" } else { "" };
        let sql = format!("SELECT * FROM {table} WHERE id = $1 AND room_id = $2{suffix}");
        let found = match kind {
            ItemKind::Apparel => sqlx::query_as::<_, ApparelInventory>(&sql)
                .bind(id)
                .bind(room_id)
                .fetch_optional(conn)
                .await?
                .map(ResolvedItem::Apparel),
            ItemKind::Supply => sqlx::query_as::<_, SupplyInventory>(&sql)
                .bind(id)
                .bind(room_id)
                .fetch_optional(conn)
                .await?
                .map(ResolvedItem::Supply),
            ItemKind::GenItem => sqlx::query_as::<_, GenItemInventory>(&sql)
                .bind(id)
                .bind(room_id)
                .fetch_optional(conn)
                .await?
                .map(ResolvedItem::GenItem),
        };
        Ok(found)
    }

    /// Como `resolve`, mas só aceita registros que pertençam à sala dada.
    /// É a verificação de posse das transferências e do release: um id que
    /// existe noutro ledger mas na sala errada não conta.
    pub async fn resolve_in_room(
        &self,
        conn: &mut PgConnection,
        item_id: Uuid,
        room_id: Uuid,
        hint: Option<ItemKind>,
        for_update: bool,
    ) -> Result<Option<ResolvedItem>, AppError> {
        if let Some(kind) = hint {
            if let Some(found) = self
                .get_kind_in_room(&mut *conn, kind, item_id, room_id, for_update)
                .await?
            {
                return Ok(Some(found));
            }
        }

        for kind in PROBE_ORDER {
            if hint == Some(kind) {
                continue;
            }
            if let Some(found) = self
                .get_kind_in_room(&mut *conn, kind, item_id, room_id, for_update)
                .await?
            {
                return Ok(Some(found));
            }
        }

        // Unidade física: vale se o inventário do lote estiver na sala.
        if let Some(batch) = self.get_batch_by_unit(&mut *conn, item_id).await? {
            if batch.room_id == room_id {
                return self
                    .get_kind_in_room(conn, batch.item_kind, batch.inventory_id, room_id, for_update)
                    .await;
            }
        }

        Ok(None)
    }

    /// Verificação de posse fora de transação (checagens pré-transição).
    pub async fn resolve_in_room_from_pool(
        &self,
        item_id: Uuid,
        room_id: Uuid,
        hint: Option<ItemKind>,
    ) -> Result<Option<ResolvedItem>, AppError> {
        let mut conn = self.pool.acquire().await?;
        self.resolve_in_room(&mut conn, item_id, room_id, hint, false)
            .await
    }

    /// Resolve um id opaco para o ledger a que pertence. A dica, quando
    /// presente, é sondada primeiro; depois vale a ordem fixa; por fim o
    /// fallback via tabela de unidades (unidade -> lote -> inventário).
    pub async fn resolve(
        &self,
        conn: &mut PgConnection,
        item_id: Uuid,
        hint: Option<ItemKind>,
        for_update: bool,
    ) -> Result<Option<ResolvedItem>, AppError> {
        if let Some(kind) = hint {
            if let Some(found) = self.get_kind(&mut *conn, kind, item_id, for_update).await? {
                return Ok(Some(found));
            }
        }

        for kind in PROBE_ORDER {
            if hint == Some(kind) {
                continue; // já sondado acima
            }
            if let Some(found) = self.get_kind(&mut *conn, kind, item_id, for_update).await? {
                return Ok(Some(found));
            }
        }

        // Fallback: o id pode ser de uma unidade física; subimos ao lote e
        // dele ao registro de inventário.
        if let Some(batch) = self.get_batch_by_unit(&mut *conn, item_id).await? {
            return self
                .get_kind(conn, batch.item_kind, batch.inventory_id, for_update)
                .await;
        }

        Ok(None)
    }

    // ---
    // Crédito (find-or-create atômico)
    // ---
    // O UPSERT com ON CONFLICT na unique constraint é o que serializa o
    // find-or-create: dois créditos concorrentes na mesma variante nunca
    // criam linhas duplicadas.

    pub async fn credit_apparel<'e, E>(
        &self,
        executor: E,
        room_id: Uuid,
        apparel_type: &str,
        apparel_for: &str,
        size: &str,
        quantity: i32,
    ) -> Result<ApparelInventory, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, ApparelInventory>(
            r#"
            INSERT INTO apparel_inventories (room_id, apparel_type, apparel_for, size, total_quantity)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (room_id, apparel_type, apparel_for, size)
            DO UPDATE SET
                total_quantity = apparel_inventories.total_quantity + EXCLUDED.total_quantity,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(room_id)
        .bind(apparel_type)
        .bind(apparel_for)
        .bind(size)
        .bind(quantity)
        .fetch_one(executor)
        .await?;
        Ok(row)
    }

    pub async fn credit_supply<'e, E>(
        &self,
        executor: E,
        room_id: Uuid,
        supply_name: &str,
        supply_type: &str,
        quantity: i32,
    ) -> Result<SupplyInventory, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, SupplyInventory>(
            r#"
            INSERT INTO supply_inventories (room_id, supply_name, supply_type, total_quantity)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (room_id, supply_name, supply_type)
            DO UPDATE SET
                total_quantity = supply_inventories.total_quantity + EXCLUDED.total_quantity,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(room_id)
        .bind(supply_name)
        .bind(supply_type)
        .bind(quantity)
        .fetch_one(executor)
        .await?;
        Ok(row)
    }

    pub async fn credit_gen_item<'e, E>(
        &self,
        executor: E,
        room_id: Uuid,
        item_name: &str,
        item_type: &str,
        quantity: i32,
    ) -> Result<GenItemInventory, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, GenItemInventory>(
            r#"
            INSERT INTO gen_item_inventories (room_id, item_name, item_type, total_quantity)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (room_id, item_name, item_type)
            DO UPDATE SET
                total_quantity = gen_item_inventories.total_quantity + EXCLUDED.total_quantity,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(room_id)
        .bind(item_name)
        .bind(item_type)
        .bind(quantity)
        .fetch_one(executor)
        .await?;
        Ok(row)
    }

    /// Credita a mesma variante do registro de origem numa sala de destino
    /// (find-or-create com atributos idênticos aos que definem o tipo).
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
        let credited = match source {
            ResolvedItem::Apparel(row) => ResolvedItem::Apparel(
                self.credit_apparel(
                    executor,
                    dest_room_id,
                    &row.apparel_type,
                    &row.apparel_for,
                    &row.size,
                    quantity,
                )
                .await?,
            ),
            ResolvedItem::Supply(row) => ResolvedItem::Supply(
                self.credit_supply(
                    executor,
                    dest_room_id,
                    &row.supply_name,
                    &row.supply_type,
                    quantity,
                )
                .await?,
            ),
            ResolvedItem::GenItem(row) => ResolvedItem::GenItem(
                self.credit_gen_item(
                    executor,
                    dest_room_id,
                    &row.item_name,
                    &row.item_type,
                    quantity,
                )
                .await?,
            ),
        };
        Ok(credited)
    }

    /// Crédito direto numa linha já conhecida (devolução de empréstimo).
    pub async fn credit_by_id<'e, E>(
        &self,
        executor: E,
        kind: ItemKind,
        id: Uuid,
        quantity: i32,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let table = kind_table(kind);
        let sql = format!(
            "UPDATE {table} SET total_quantity = total_quantity + $2, updated_at = NOW() WHERE id = $1"
        );
        let result = sqlx::query(&sql).bind(id).bind(quantity).execute(executor).await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Registro de inventário"));
        }
        Ok(())
    }

    // ---
    // Débito
    // ---

    /// Debita uma linha já travada pelo chamador. A guarda de quantidade
    /// fica no service (que leu a linha com FOR UPDATE); o GREATEST é o
    /// cinto de segurança do invariante total_quantity >= 0.
    pub async fn debit_by_id<'e, E>(
        &self,
        executor: E,
        kind: ItemKind,
        id: Uuid,
        quantity: i32,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let table = kind_table(kind);
        let sql = format!(
            "UPDATE {table} SET total_quantity = GREATEST(total_quantity - $2, 0), updated_at = NOW() WHERE id = $1"
        );
        let result = sqlx::query(&sql).bind(id).bind(quantity).execute(executor).await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Registro de inventário"));
        }
        Ok(())
    }

    // ---
    // Lotes de entrada e unidades
    // ---

    pub async fn create_receipt_batch<'e, E>(
        &self,
        executor: E,
        kind: ItemKind,
        inventory_id: Uuid,
        room_id: Uuid,
        delivered_by: &str,
        source: Option<&str>,
        quantity: i32,
    ) -> Result<ReceiptBatch, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let batch = sqlx::query_as::<_, ReceiptBatch>(
            r#"
            INSERT INTO receipt_batches (item_kind, inventory_id, room_id, delivered_by, source, quantity)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(kind)
        .bind(inventory_id)
        .bind(room_id)
        .bind(delivered_by)
        .bind(source)
        .bind(quantity)
        .fetch_one(executor)
        .await?;
        Ok(batch)
    }

    /// Gera as linhas por unidade de um lote, todas "in_stock".
    /// contagem de unidades == quantidade do lote na criação.
    pub async fn create_batch_units<'e, E>(
        &self,
        executor: E,
        batch_id: Uuid,
        quantity: i32,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO batch_units (batch_id, status)
            SELECT $1, 'in_stock'::unit_status FROM generate_series(1, $2)
            "#,
        )
        .bind(batch_id)
        .bind(quantity)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Lote ao qual uma unidade física pertence (fallback do resolver e
    /// verificação de posse nas transferências).
    pub async fn get_batch_by_unit<'e, E>(
        &self,
        executor: E,
        unit_id: Uuid,
    ) -> Result<Option<ReceiptBatch>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let batch = sqlx::query_as::<_, ReceiptBatch>(
            r#"
            SELECT b.* FROM receipt_batches b
            JOIN batch_units u ON u.batch_id = b.id
            WHERE u.id = $1
            "#,
        )
        .bind(unit_id)
        .fetch_optional(executor)
        .await?;
        Ok(batch)
    }
}

fn kind_table(kind: ItemKind) -> &'static str {
    match kind {
        ItemKind::Apparel => "apparel_inventories",
        ItemKind::Supply => "supply_inventories",
        ItemKind::GenItem => "gen_item_inventories",
    }
}
