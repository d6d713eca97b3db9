// src/services/transfer_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{RoomRepository, TransferRepository},
    models::{
        auth::Actor,
        room::Room,
        transfer::{TransferRequest, TransferStatus},
    },
    services::{activity_service::ActivityService, inventory_service::InventoryService},
};

// Transferência sala-a-sala. O aceite debita a origem, faz find-or-create
// da mesma variante no destino, credita e registra o lote de entrada, tudo
// numa transação só. Ordem de locks: linha da transferência, ledger de
// origem, ledger de destino (o UPSERT do destino trava por último).
#[derive(Clone)]
pub struct TransferService {
    transfer_repo: TransferRepository,
    room_repo: RoomRepository,
    inventory_service: InventoryService,
    activity: ActivityService,
}

impl TransferService {
    pub fn new(
        transfer_repo: TransferRepository,
        room_repo: RoomRepository,
        inventory_service: InventoryService,
        activity: ActivityService,
    ) -> Self {
        Self {
            transfer_repo,
            room_repo,
            inventory_service,
            activity,
        }
    }

    async fn get_room(&self, room_id: Uuid, which: &'static str) -> Result<Room, AppError> {
        self.room_repo
            .get_room_from_pool(room_id)
            .await?
            .ok_or(AppError::NotFound(which))
    }

    // --- CREATE ---
    pub async fn create(
        &self,
        pool: &PgPool,
        actor: Actor,
        from_room_id: Uuid,
        to_room_id: Uuid,
        item_type: &str,
        item_id: Uuid,
        quantity: i32,
        note: Option<&str>,
    ) -> Result<TransferRequest, AppError> {
        let from_room = self.get_room(from_room_id, "Sala de origem").await?;
        let to_room = self.get_room(to_room_id, "Sala de destino").await?;

        if !to_room.room_type.accepts_stock() {
            return Err(AppError::invalid_field(
                "toRoomId",
                "invalid_destination",
                "O destino de uma transferência precisa ser sala de estoque.",
            ));
        }
        if !from_room.is_in_charge(actor.id) {
            return Err(AppError::Forbidden(
                "Apenas o responsável pela sala de origem pode criar a transferência.".into(),
            ));
        }

        // Verificação de posse: o item precisa existir fisicamente na sala
        // de origem (ledgers e, em último caso, unidades).
        let found = self
            .inventory_service
            .find_in_room(item_id, from_room_id, Some(item_type))
            .await?;
        if found.is_none() {
            return Err(AppError::ItemNotInRoom);
        }

        let transfer = self
            .transfer_repo
            .create(
                pool,
                from_room_id,
                to_room_id,
                actor.id,
                item_type,
                item_id,
                quantity,
                note,
            )
            .await?;

        self.activity
            .log(
                actor.id,
                "TRANSFER_CREATED",
                &format!(
                    "Transferência {} criada: {} unidade(s) de {} para {}",
                    transfer.id, quantity, from_room.name, to_room.name
                ),
            )
            .await;

        Ok(transfer)
    }

    // --- ACCEPT ---
    pub async fn accept(
        &self,
        pool: &PgPool,
        actor: Actor,
        id: Uuid,
    ) -> Result<TransferRequest, AppError> {
        let transfer = self
            .transfer_repo
            .get_from_pool(id)
            .await?
            .ok_or(AppError::NotFound("Transferência"))?;
        let from_room = self.get_room(transfer.from_room_id, "Sala de origem").await?;
        let to_room = self.get_room(transfer.to_room_id, "Sala de destino").await?;

        if !actor.is_admin() && !to_room.is_in_charge(actor.id) {
            return Err(AppError::Forbidden(
                "Apenas a administração ou o responsável pela sala de destino pode aceitar.".into(),
            ));
        }

        let mut tx = pool.begin().await?;

        let transfer = self
            .transfer_repo
            .get_by_id_for_update(&mut tx, id)
            .await?
            .ok_or(AppError::NotFound("Transferência"))?;
        if !transfer.status.can_accept() {
            return Err(AppError::InvalidState(format!(
                "Transferência em '{}' não permite aceite.",
                transfer.status.as_str()
            )));
        }

        // Lock + débito na origem.
        let source = self
            .inventory_service
            .resolve_in_room(
                &mut tx,
                transfer.item_id,
                transfer.from_room_id,
                Some(&transfer.item_type),
                true,
            )
            .await?
            .ok_or(AppError::ItemNotInRoom)?;

        let available = source.total_quantity();
        if available < transfer.quantity {
            return Err(AppError::InsufficientStock {
                available,
                requested: transfer.quantity,
            });
        }
        self.inventory_service
            .debit_resolved(&mut *tx, &source, transfer.quantity)
            .await?;

        // Crédito no destino (mesma variante, find-or-create) + lote.
        let credited = self
            .inventory_service
            .credit_matching(&mut *tx, &source, transfer.to_room_id, transfer.quantity)
            .await?;
        self.inventory_service
            .record_receipt(
                &mut tx,
                &credited,
                transfer.to_room_id,
                &from_room.name,
                Some(&format!("Transfer #{}", transfer.id)),
                transfer.quantity,
            )
            .await?;

        let transfer = self.transfer_repo.mark_accepted(&mut *tx, id, actor.id).await?;
        tx.commit().await?;

        self.activity
            .log(
                actor.id,
                "TRANSFER_ACCEPTED",
                &format!(
                    "Transferência {} aceita: {} x {} movido(s) para {}",
                    id,
                    transfer.quantity,
                    source.display_name(),
                    to_room.name
                ),
            )
            .await;

        Ok(transfer)
    }

    pub async fn get(&self, pool: &PgPool, id: Uuid) -> Result<TransferRequest, AppError> {
        self.transfer_repo
            .get_by_id(pool, id)
            .await?
            .ok_or(AppError::NotFound("Transferência"))
    }

    pub async fn list(
        &self,
        pool: &PgPool,
        status: Option<TransferStatus>,
    ) -> Result<Vec<TransferRequest>, AppError> {
        self.transfer_repo.list(pool, status).await
    }
}
