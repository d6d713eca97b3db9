// src/services/borrow_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{BorrowRepository, RoomRepository},
    models::{
        auth::Actor,
        borrow::{BorrowRequest, BorrowStatus},
        room::Room,
    },
    services::{activity_service::ActivityService, inventory_service::InventoryService},
};

// Máquina de estados do empréstimo. Cada transição que muta o ledger
// (acquire, accept-return) roda numa única transação: lock da linha do
// empréstimo, resolve com lock do registro de inventário, mutação e
// atualização de status, tudo ou nada.
#[derive(Clone)]
pub struct BorrowService {
    borrow_repo: BorrowRepository,
    room_repo: RoomRepository,
    inventory_service: InventoryService,
    activity: ActivityService,
}

impl BorrowService {
    pub fn new(
        borrow_repo: BorrowRepository,
        room_repo: RoomRepository,
        inventory_service: InventoryService,
        activity: ActivityService,
    ) -> Self {
        Self {
            borrow_repo,
            room_repo,
            inventory_service,
            activity,
        }
    }

    async fn get_room(&self, room_id: Uuid) -> Result<Room, AppError> {
        self.room_repo
            .get_room_from_pool(room_id)
            .await?
            .ok_or(AppError::NotFound("Sala"))
    }

    async fn get_borrow(&self, id: Uuid) -> Result<BorrowRequest, AppError> {
        self.borrow_repo
            .get_from_pool(id)
            .await?
            .ok_or(AppError::NotFound("Empréstimo"))
    }

    // Quem revisa (aprova/recusa) é o responsável pela sala ou o
    // super-admin; nunca o próprio requerente.
    fn ensure_reviewer(actor: Actor, borrow: &BorrowRequest, room: &Room) -> Result<(), AppError> {
        if actor.id == borrow.requester_id {
            return Err(AppError::Forbidden(
                "O requerente não pode revisar o próprio empréstimo.".into(),
            ));
        }
        if room.is_in_charge(actor.id) || actor.is_super_admin() {
            return Ok(());
        }
        Err(AppError::Forbidden(
            "Apenas o responsável pela sala pode revisar este empréstimo.".into(),
        ))
    }

    fn invalid_state(action: &str, status: BorrowStatus) -> AppError {
        AppError::InvalidState(format!(
            "Empréstimo em '{}' não permite {}.",
            status.as_str(),
            action
        ))
    }

    // --- CREATE ---
    pub async fn create(
        &self,
        pool: &PgPool,
        actor: Actor,
        room_id: Uuid,
        item_id: Option<Uuid>,
        item_type: Option<&str>,
        quantity: i32,
        note: Option<&str>,
    ) -> Result<BorrowRequest, AppError> {
        self.get_room(room_id).await?;

        let borrow = self
            .borrow_repo
            .create(pool, actor.id, room_id, item_id, item_type, quantity, note)
            .await?;

        self.activity
            .log(
                actor.id,
                "BORROW_CREATED",
                &format!("Empréstimo {} criado ({} unidade(s))", borrow.id, quantity),
            )
            .await;

        Ok(borrow)
    }

    // --- APPROVE ---
    pub async fn approve(
        &self,
        pool: &PgPool,
        actor: Actor,
        id: Uuid,
    ) -> Result<BorrowRequest, AppError> {
        let borrow = self.get_borrow(id).await?;
        let room = self.get_room(borrow.room_id).await?;
        Self::ensure_reviewer(actor, &borrow, &room)?;

        let mut tx = pool.begin().await?;

        // Relê com lock: o status pode ter mudado desde a checagem acima.
        let borrow = self
            .borrow_repo
            .get_by_id_for_update(&mut tx, id)
            .await?
            .ok_or(AppError::NotFound("Empréstimo"))?;
        if !borrow.status.can_review() {
            return Err(Self::invalid_state("aprovação", borrow.status));
        }

        let borrow = self.borrow_repo.mark_approved(&mut *tx, id, actor.id).await?;
        tx.commit().await?;

        self.activity
            .log(actor.id, "BORROW_APPROVED", &format!("Empréstimo {} aprovado", id))
            .await;

        Ok(borrow)
    }

    // --- DECLINE ---
    pub async fn decline(
        &self,
        pool: &PgPool,
        actor: Actor,
        id: Uuid,
        reason: Option<&str>,
    ) -> Result<BorrowRequest, AppError> {
        let borrow = self.get_borrow(id).await?;
        let room = self.get_room(borrow.room_id).await?;
        Self::ensure_reviewer(actor, &borrow, &room)?;

        let mut tx = pool.begin().await?;

        let borrow = self
            .borrow_repo
            .get_by_id_for_update(&mut tx, id)
            .await?
            .ok_or(AppError::NotFound("Empréstimo"))?;
        if !borrow.status.can_review() {
            return Err(Self::invalid_state("recusa", borrow.status));
        }

        let borrow = self
            .borrow_repo
            .mark_declined(&mut *tx, id, actor.id, reason)
            .await?;
        tx.commit().await?;

        self.activity
            .log(actor.id, "BORROW_DECLINED", &format!("Empréstimo {} recusado", id))
            .await;

        Ok(borrow)
    }

    // --- CANCEL (somente o requerente) ---
    pub async fn cancel(
        &self,
        pool: &PgPool,
        actor: Actor,
        id: Uuid,
    ) -> Result<BorrowRequest, AppError> {
        let borrow = self.get_borrow(id).await?;
        if actor.id != borrow.requester_id {
            return Err(AppError::Forbidden(
                "Apenas o requerente pode cancelar o empréstimo.".into(),
            ));
        }

        let mut tx = pool.begin().await?;

        let borrow = self
            .borrow_repo
            .get_by_id_for_update(&mut tx, id)
            .await?
            .ok_or(AppError::NotFound("Empréstimo"))?;
        if !borrow.status.can_cancel() {
            return Err(Self::invalid_state("cancelamento", borrow.status));
        }

        let borrow = self.borrow_repo.mark_cancelled(&mut *tx, id).await?;
        tx.commit().await?;

        self.activity
            .log(actor.id, "BORROW_CANCELLED", &format!("Empréstimo {} cancelado", id))
            .await;

        Ok(borrow)
    }

    // --- ACQUIRE (debita o ledger) ---
    pub async fn acquire(
        &self,
        pool: &PgPool,
        actor: Actor,
        id: Uuid,
    ) -> Result<BorrowRequest, AppError> {
        let borrow = self.get_borrow(id).await?;
        if actor.id != borrow.requester_id {
            return Err(AppError::Forbidden(
                "Apenas o requerente pode retirar o item.".into(),
            ));
        }

        let mut tx = pool.begin().await?;

        // Ordem de locks: linha do workflow primeiro, depois o ledger.
        let borrow = self
            .borrow_repo
            .get_by_id_for_update(&mut tx, id)
            .await?
            .ok_or(AppError::NotFound("Empréstimo"))?;
        if !borrow.status.can_acquire() {
            return Err(Self::invalid_state("retirada", borrow.status));
        }

        let item_id = borrow.item_id.ok_or(AppError::NotFound("Item do empréstimo"))?;
        let resolved = self
            .inventory_service
            .resolve(&mut tx, item_id, borrow.item_type.as_deref(), true)
            .await?
            .ok_or(AppError::NotFound("Item do empréstimo"))?;

        let available = resolved.total_quantity();
        if available < borrow.quantity {
            // Transação abandonada sem commit: rollback completo.
            return Err(AppError::InsufficientStock {
                available,
                requested: borrow.quantity,
            });
        }

        self.inventory_service
            .debit_resolved(&mut *tx, &resolved, borrow.quantity)
            .await?;
        let borrow = self.borrow_repo.mark_acquired(&mut *tx, id, actor.id).await?;
        tx.commit().await?;

        self.activity
            .log(
                actor.id,
                "BORROW_ACQUIRED",
                &format!(
                    "Empréstimo {}: {} x {} retirado(s)",
                    id,
                    borrow.quantity,
                    resolved.display_name()
                ),
            )
            .await;

        Ok(borrow)
    }

    // --- RETURN (requerente ou quem retirou) ---
    pub async fn start_return(
        &self,
        pool: &PgPool,
        actor: Actor,
        id: Uuid,
        note: Option<&str>,
    ) -> Result<BorrowRequest, AppError> {
        let borrow = self.get_borrow(id).await?;
        let is_acquirer = borrow.acquired_by == Some(actor.id);
        if actor.id != borrow.requester_id && !is_acquirer {
            return Err(AppError::Forbidden(
                "Apenas o requerente ou quem retirou pode devolver.".into(),
            ));
        }

        let mut tx = pool.begin().await?;

        let borrow = self
            .borrow_repo
            .get_by_id_for_update(&mut tx, id)
            .await?
            .ok_or(AppError::NotFound("Empréstimo"))?;
        if !borrow.status.can_return() {
            return Err(Self::invalid_state("devolução", borrow.status));
        }

        let borrow = self
            .borrow_repo
            .mark_in_return(&mut *tx, id, actor.id, note)
            .await?;
        tx.commit().await?;

        self.activity
            .log(actor.id, "BORROW_RETURNED", &format!("Empréstimo {} em devolução", id))
            .await;

        Ok(borrow)
    }

    // --- ACCEPT RETURN (credita o ledger de volta) ---
    pub async fn accept_return(
        &self,
        pool: &PgPool,
        actor: Actor,
        id: Uuid,
    ) -> Result<BorrowRequest, AppError> {
        let borrow = self.get_borrow(id).await?;
        let room = self.get_room(borrow.room_id).await?;
        if !room.is_in_charge(actor.id) {
            return Err(AppError::Forbidden(
                "Apenas o responsável pela sala pode aceitar a devolução.".into(),
            ));
        }

        let mut tx = pool.begin().await?;

        let borrow = self
            .borrow_repo
            .get_by_id_for_update(&mut tx, id)
            .await?
            .ok_or(AppError::NotFound("Empréstimo"))?;
        if !borrow.status.can_accept_return() {
            return Err(Self::invalid_state("aceite de devolução", borrow.status));
        }

        let item_id = borrow.item_id.ok_or(AppError::NotFound("Item do empréstimo"))?;
        let resolved = self
            .inventory_service
            .resolve(&mut tx, item_id, borrow.item_type.as_deref(), true)
            .await?
            .ok_or(AppError::NotFound("Item do empréstimo"))?;

        self.inventory_service
            .credit_resolved(&mut *tx, &resolved, borrow.quantity)
            .await?;
        let borrow = self
            .borrow_repo
            .mark_return_accepted(&mut *tx, id, actor.id)
            .await?;
        tx.commit().await?;

        self.activity
            .log(
                actor.id,
                "BORROW_RETURN_ACCEPTED",
                &format!("Empréstimo {}: devolução aceita", id),
            )
            .await;

        Ok(borrow)
    }

    pub async fn get(&self, pool: &PgPool, id: Uuid) -> Result<BorrowRequest, AppError> {
        self.borrow_repo
            .get_by_id(pool, id)
            .await?
            .ok_or(AppError::NotFound("Empréstimo"))
    }

    pub async fn list(
        &self,
        pool: &PgPool,
        status: Option<BorrowStatus>,
    ) -> Result<Vec<BorrowRequest>, AppError> {
        self.borrow_repo.list(pool, status).await
    }
}
