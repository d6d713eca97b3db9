// src/services/request_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{RequestRepository, RoomRepository},
    models::{
        auth::Actor,
        request::{
            DetailDecision, ItemRequest, ItemRequestStatus, ItemRequestWithDetails, StockRequest,
            StockRequestStatus,
        },
        room::Room,
    },
    services::{activity_service::ActivityService, inventory_service::InventoryService},
};

// Duas variantes da mesma máquina: pedido de item (sala -> sala
// fornecedora) e pedido de estoque (sala -> administração central).
// O release debita o fornecedor linha a linha sem liberação parcial; o
// fulfill credita a sala requerente e registra o lote com a proveniência.
#[derive(Clone)]
pub struct RequestService {
    request_repo: RequestRepository,
    room_repo: RoomRepository,
    inventory_service: InventoryService,
    activity: ActivityService,
}

/// Linha de criação de pedido de item, já validada pelo handler.
#[derive(Debug, Clone)]
pub struct NewRequestLine {
    pub item_id: Option<Uuid>,
    pub item_type: Option<String>,
    pub other_item_name: Option<String>,
    pub quantity: i32,
}

impl RequestService {
    pub fn new(
        request_repo: RequestRepository,
        room_repo: RoomRepository,
        inventory_service: InventoryService,
        activity: ActivityService,
    ) -> Self {
        Self {
            request_repo,
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

    fn ensure_supplier_side(actor: Actor, supplier_room: &Room) -> Result<(), AppError> {
        if actor.is_admin() || supplier_room.is_in_charge(actor.id) {
            return Ok(());
        }
        Err(AppError::Forbidden(
            "Apenas a administração ou o responsável pela sala fornecedora pode fazer isso.".into(),
        ))
    }

    fn invalid_item_state(action: &str, status: ItemRequestStatus) -> AppError {
        AppError::InvalidState(format!(
            "Pedido de item em '{}' não permite {}.",
            status.as_str(),
            action
        ))
    }

    fn invalid_stock_state(action: &str, status: StockRequestStatus) -> AppError {
        AppError::InvalidState(format!(
            "Pedido de estoque em '{}' não permite {}.",
            status.as_str(),
            action
        ))
    }

    // =========================================================================
    //  PEDIDO DE ITEM
    // =========================================================================

    // --- CREATE ---
    pub async fn create_item_request(
        &self,
        pool: &PgPool,
        actor: Actor,
        requester_room_id: Uuid,
        supplier_room_id: Uuid,
        note: Option<&str>,
        lines: Vec<NewRequestLine>,
    ) -> Result<ItemRequestWithDetails, AppError> {
        let requester_room = self.get_room(requester_room_id, "Sala requerente").await?;
        let supplier_room = self.get_room(supplier_room_id, "Sala fornecedora").await?;

        if !supplier_room.room_type.accepts_stock() {
            return Err(AppError::invalid_field(
                "roomId",
                "invalid_supplier",
                "Pedidos de item só podem ser feitos a salas de estoque.",
            ));
        }
        if !actor.is_admin() && !requester_room.is_in_charge(actor.id) {
            return Err(AppError::Forbidden(
                "Apenas o responsável pela sala requerente pode pedir itens para ela.".into(),
            ));
        }
        if lines.is_empty() {
            return Err(AppError::invalid_field(
                "details",
                "empty",
                "O pedido precisa de pelo menos uma linha.",
            ));
        }

        let mut tx = pool.begin().await?;
        let header = self
            .request_repo
            .create_item_request(&mut *tx, actor.id, requester_room_id, supplier_room_id, note)
            .await?;
        let mut details = Vec::with_capacity(lines.len());
        for line in &lines {
            let detail = self
                .request_repo
                .add_detail(
                    &mut *tx,
                    header.id,
                    line.item_id,
                    line.item_type.as_deref(),
                    line.other_item_name.as_deref(),
                    line.quantity,
                )
                .await?;
            details.push(detail);
        }
        tx.commit().await?;

        self.activity
            .log(
                actor.id,
                "ITEM_REQUEST_CREATED",
                &format!(
                    "Pedido de item {} criado ({} linha(s)) para a sala {}",
                    header.id,
                    details.len(),
                    supplier_room.name
                ),
            )
            .await;

        Ok(ItemRequestWithDetails { header, details })
    }

    // --- ACCEPT (granular por linha ou em bloco) ---
    // Sem decisões: aceita tudo. Com decisões: cada linha citada segue a
    // decisão; linhas não citadas são recusadas. O cabeçalho vira
    // 'accepted' se alguma linha foi aceita, 'declined' se todas recusadas.
    pub async fn accept_item_request(
        &self,
        pool: &PgPool,
        actor: Actor,
        id: Uuid,
        decisions: Option<Vec<DetailDecision>>,
    ) -> Result<ItemRequestWithDetails, AppError> {
        let header = self
            .request_repo
            .get_item_request(pool, id)
            .await?
            .ok_or(AppError::NotFound("Pedido de item"))?;
        let supplier_room = self.get_room(header.room_id, "Sala fornecedora").await?;
        Self::ensure_supplier_side(actor, &supplier_room)?;

        let mut tx = pool.begin().await?;

        let header = self
            .request_repo
            .get_item_request_for_update(&mut tx, id)
            .await?
            .ok_or(AppError::NotFound("Pedido de item"))?;
        if !header.status.can_review() {
            return Err(Self::invalid_item_state("revisão", header.status));
        }

        let details = self.request_repo.get_details(&mut *tx, id).await?;
        if let Some(decisions) = &decisions {
            for decision in decisions {
                if !details.iter().any(|d| d.id == decision.detail_id) {
                    return Err(AppError::NotFound("Linha do pedido"));
                }
            }
        }

        let mut updated_details = Vec::with_capacity(details.len());
        let mut any_accepted = false;
        for detail in &details {
            let accept = match &decisions {
                None => true,
                Some(decisions) => decisions
                    .iter()
                    .find(|d| d.detail_id == detail.id)
                    .map(|d| d.accept)
                    .unwrap_or(false),
            };
            let status = if accept {
                any_accepted = true;
                ItemRequestStatus::Accepted
            } else {
                ItemRequestStatus::Declined
            };
            updated_details.push(
                self.request_repo
                    .set_detail_status(&mut *tx, detail.id, status)
                    .await?,
            );
        }

        let header = if any_accepted {
            self.request_repo
                .mark_item_request_accepted(&mut *tx, id, actor.id)
                .await?
        } else {
            self.request_repo
                .mark_item_request_declined(&mut *tx, id, actor.id)
                .await?
        };
        tx.commit().await?;

        self.activity
            .log(
                actor.id,
                "ITEM_REQUEST_REVIEWED",
                &format!("Pedido de item {} revisado: {}", id, header.status.as_str()),
            )
            .await;

        Ok(ItemRequestWithDetails {
            header,
            details: updated_details,
        })
    }

    // --- DECLINE ---
    // Recusar não re-credita nada: nenhum estoque foi debitado antes do
    // aceite.
    pub async fn decline_item_request(
        &self,
        pool: &PgPool,
        actor: Actor,
        id: Uuid,
    ) -> Result<ItemRequestWithDetails, AppError> {
        let header = self
            .request_repo
            .get_item_request(pool, id)
            .await?
            .ok_or(AppError::NotFound("Pedido de item"))?;
        let supplier_room = self.get_room(header.room_id, "Sala fornecedora").await?;
        Self::ensure_supplier_side(actor, &supplier_room)?;

        let mut tx = pool.begin().await?;

        let header = self
            .request_repo
            .get_item_request_for_update(&mut tx, id)
            .await?
            .ok_or(AppError::NotFound("Pedido de item"))?;
        if !header.status.can_review() {
            return Err(Self::invalid_item_state("recusa", header.status));
        }

        let details = self.request_repo.get_details(&mut *tx, id).await?;
        let mut updated_details = Vec::with_capacity(details.len());
        for detail in &details {
            updated_details.push(
                self.request_repo
                    .set_detail_status(&mut *tx, detail.id, ItemRequestStatus::Declined)
                    .await?,
            );
        }
        let header = self
            .request_repo
            .mark_item_request_declined(&mut *tx, id, actor.id)
            .await?;
        tx.commit().await?;

        self.activity
            .log(
                actor.id,
                "ITEM_REQUEST_DECLINED",
                &format!("Pedido de item {} recusado", id),
            )
            .await;

        Ok(ItemRequestWithDetails {
            header,
            details: updated_details,
        })
    }

    // --- RELEASE (debita o fornecedor) ---
    // Sem liberação parcial: qualquer linha aceita sem estoque aborta a
    // transação inteira; em seguida, numa transação própria, o pedido é
    // marcado out_of_stock para a tentativa ficar visível.
    pub async fn release_item_request(
        &self,
        pool: &PgPool,
        actor: Actor,
        id: Uuid,
    ) -> Result<ItemRequestWithDetails, AppError> {
        let header = self
            .request_repo
            .get_item_request(pool, id)
            .await?
            .ok_or(AppError::NotFound("Pedido de item"))?;
        let supplier_room = self.get_room(header.room_id, "Sala fornecedora").await?;
        Self::ensure_supplier_side(actor, &supplier_room)?;

        let result = self.release_in_tx(pool, actor, id).await;
        if let Err(AppError::InsufficientStock { .. }) = &result {
            self.request_repo.mark_item_request_out_of_stock(id).await?;
        }
        let with_details = result?;

        self.activity
            .log(
                actor.id,
                "ITEM_REQUEST_RELEASED",
                &format!("Pedido de item {} liberado pelo fornecedor", id),
            )
            .await;

        Ok(with_details)
    }

    async fn release_in_tx(
        &self,
        pool: &PgPool,
        actor: Actor,
        id: Uuid,
    ) -> Result<ItemRequestWithDetails, AppError> {
        let mut tx = pool.begin().await?;

        let header = self
            .request_repo
            .get_item_request_for_update(&mut tx, id)
            .await?
            .ok_or(AppError::NotFound("Pedido de item"))?;
        if !header.status.can_release() {
            return Err(Self::invalid_item_state("liberação", header.status));
        }

        let details = self.request_repo.get_details(&mut *tx, id).await?;
        let mut updated_details = Vec::with_capacity(details.len());
        for detail in &details {
            // Linhas recusadas ficam exatamente como estão.
            if detail.status != ItemRequestStatus::Accepted {
                updated_details.push(detail.clone());
                continue;
            }

            if let Some(item_id) = detail.item_id {
                let resolved = self
                    .inventory_service
                    .resolve_in_room(
                        &mut tx,
                        item_id,
                        header.room_id,
                        detail.item_type.as_deref(),
                        true,
                    )
                    .await?;
                if let Some(resolved) = resolved {
                    let available = resolved.total_quantity();
                    if available < detail.quantity {
                        return Err(AppError::InsufficientStock {
                            available,
                            requested: detail.quantity,
                        });
                    }
                    self.inventory_service
                        .debit_resolved(&mut *tx, &resolved, detail.quantity)
                        .await?;
                }
            }

            updated_details.push(
                self.request_repo
                    .set_detail_status(&mut *tx, detail.id, ItemRequestStatus::Released)
                    .await?,
            );
        }

        let header = self
            .request_repo
            .mark_item_request_released(&mut *tx, id, actor.id)
            .await?;
        tx.commit().await?;

        Ok(ItemRequestWithDetails {
            header,
            details: updated_details,
        })
    }

    // --- FULFILL (credita a sala requerente) ---
    pub async fn fulfill_item_request(
        &self,
        pool: &PgPool,
        actor: Actor,
        id: Uuid,
    ) -> Result<ItemRequestWithDetails, AppError> {
        let header = self
            .request_repo
            .get_item_request(pool, id)
            .await?
            .ok_or(AppError::NotFound("Pedido de item"))?;
        let requester_room = self
            .get_room(header.requester_room_id, "Sala requerente")
            .await?;
        let supplier_room = self.get_room(header.room_id, "Sala fornecedora").await?;

        let is_requester_side =
            actor.id == header.requester_id || requester_room.is_in_charge(actor.id);
        if !actor.is_admin() && !is_requester_side {
            return Err(AppError::Forbidden(
                "Apenas quem pediu (ou a administração) pode confirmar o recebimento.".into(),
            ));
        }

        let mut tx = pool.begin().await?;

        let header = self
            .request_repo
            .get_item_request_for_update(&mut tx, id)
            .await?
            .ok_or(AppError::NotFound("Pedido de item"))?;
        if !header.status.can_fulfill() {
            return Err(Self::invalid_item_state("recebimento", header.status));
        }

        let provenance = format!("ItemRequest #{}", id);
        let details = self.request_repo.get_details(&mut *tx, id).await?;
        let mut updated_details = Vec::with_capacity(details.len());
        for detail in &details {
            if detail.status != ItemRequestStatus::Released {
                updated_details.push(detail.clone());
                continue;
            }

            // Linhas de texto livre ("other") não tocam o inventário: só o
            // status avança.
            if let Some(item_id) = detail.item_id {
                let resolved = self
                    .inventory_service
                    .resolve(&mut tx, item_id, detail.item_type.as_deref(), false)
                    .await?;
                if let Some(resolved) = resolved {
                    let credited = self
                        .inventory_service
                        .credit_matching(
                            &mut *tx,
                            &resolved,
                            header.requester_room_id,
                            detail.quantity,
                        )
                        .await?;
                    self.inventory_service
                        .record_receipt(
                            &mut tx,
                            &credited,
                            header.requester_room_id,
                            &supplier_room.name,
                            Some(&provenance),
                            detail.quantity,
                        )
                        .await?;
                }
            }

            updated_details.push(
                self.request_repo
                    .set_detail_status(&mut *tx, detail.id, ItemRequestStatus::Fulfilled)
                    .await?,
            );
        }

        let header = self
            .request_repo
            .mark_item_request_fulfilled(&mut *tx, id, actor.id)
            .await?;
        tx.commit().await?;

        self.activity
            .log(
                actor.id,
                "ITEM_REQUEST_FULFILLED",
                &format!("Pedido de item {} recebido pela sala requerente", id),
            )
            .await;

        Ok(ItemRequestWithDetails {
            header,
            details: updated_details,
        })
    }

    pub async fn get_item_request(
        &self,
        pool: &PgPool,
        id: Uuid,
    ) -> Result<ItemRequestWithDetails, AppError> {
        let header = self
            .request_repo
            .get_item_request(pool, id)
            .await?
            .ok_or(AppError::NotFound("Pedido de item"))?;
        let details = self.request_repo.get_details(pool, id).await?;
        Ok(ItemRequestWithDetails { header, details })
    }

    pub async fn list_item_requests(
        &self,
        pool: &PgPool,
        status: Option<ItemRequestStatus>,
    ) -> Result<Vec<ItemRequest>, AppError> {
        self.request_repo.list_item_requests(pool, status).await
    }

    // =========================================================================
    //  PEDIDO DE ESTOQUE (administração central)
    // =========================================================================

    // --- CREATE ---
    pub async fn create_stock_request(
        &self,
        pool: &PgPool,
        actor: Actor,
        room_id: Uuid,
        item_id: Option<Uuid>,
        item_type: Option<&str>,
        other_item_name: Option<&str>,
        quantity: i32,
        note: Option<&str>,
    ) -> Result<StockRequest, AppError> {
        self.get_room(room_id, "Sala").await?;
        if item_id.is_none() && other_item_name.is_none() {
            return Err(AppError::invalid_field(
                "itemId",
                "missing_item",
                "Informe o item do catálogo ou o nome de um item avulso.",
            ));
        }

        let request = self
            .request_repo
            .create_stock_request(
                pool,
                actor.id,
                room_id,
                item_id,
                item_type,
                other_item_name,
                quantity,
                note,
            )
            .await?;

        self.activity
            .log(
                actor.id,
                "STOCK_REQUEST_CREATED",
                &format!("Pedido de estoque {} criado ({} unidade(s))", request.id, quantity),
            )
            .await;

        Ok(request)
    }

    // --- APPROVE (quantidade pode ser emendada) ---
    pub async fn approve_stock_request(
        &self,
        pool: &PgPool,
        actor: Actor,
        id: Uuid,
        approved_quantity: Option<i32>,
    ) -> Result<StockRequest, AppError> {
        actor.ensure_admin("aprovar pedidos de estoque")?;

        let mut tx = pool.begin().await?;

        let request = self
            .request_repo
            .get_stock_request_for_update(&mut tx, id)
            .await?
            .ok_or(AppError::NotFound("Pedido de estoque"))?;
        if !request.status.can_review() {
            return Err(Self::invalid_stock_state("aprovação", request.status));
        }

        let request = self
            .request_repo
            .mark_stock_request_approved(&mut *tx, id, actor.id, approved_quantity)
            .await?;
        tx.commit().await?;

        self.activity
            .log(
                actor.id,
                "STOCK_REQUEST_APPROVED",
                &format!(
                    "Pedido de estoque {} aprovado ({} unidade(s))",
                    id,
                    request.effective_quantity()
                ),
            )
            .await;

        Ok(request)
    }

    // --- DISAPPROVE ---
    // Nada a re-creditar: nenhum estoque foi debitado antes da aprovação.
    pub async fn disapprove_stock_request(
        &self,
        pool: &PgPool,
        actor: Actor,
        id: Uuid,
    ) -> Result<StockRequest, AppError> {
        actor.ensure_admin("reprovar pedidos de estoque")?;

        let mut tx = pool.begin().await?;

        let request = self
            .request_repo
            .get_stock_request_for_update(&mut tx, id)
            .await?
            .ok_or(AppError::NotFound("Pedido de estoque"))?;
        if !request.status.can_review() {
            return Err(Self::invalid_stock_state("reprovação", request.status));
        }

        let request = self
            .request_repo
            .mark_stock_request_disapproved(&mut *tx, id, actor.id)
            .await?;
        tx.commit().await?;

        self.activity
            .log(
                actor.id,
                "STOCK_REQUEST_DISAPPROVED",
                &format!("Pedido de estoque {} reprovado", id),
            )
            .await;

        Ok(request)
    }

    // --- FULFILL (credita a sala requerente) ---
    // Um item de catálogo que não resolve marca o pedido failed_request
    // numa transação própria e devolve NotFound; itens avulsos só avançam
    // o status.
    pub async fn fulfill_stock_request(
        &self,
        pool: &PgPool,
        actor: Actor,
        id: Uuid,
    ) -> Result<StockRequest, AppError> {
        actor.ensure_admin("atender pedidos de estoque")?;

        let result = self.fulfill_stock_in_tx(pool, actor, id).await;
        if matches!(&result, Err(AppError::NotFound(entity)) if *entity == "Item do pedido") {
            self.request_repo.mark_stock_request_failed(id).await?;
        }
        let request = result?;

        self.activity
            .log(
                actor.id,
                "STOCK_REQUEST_FULFILLED",
                &format!("Pedido de estoque {} atendido", id),
            )
            .await;

        Ok(request)
    }

    async fn fulfill_stock_in_tx(
        &self,
        pool: &PgPool,
        actor: Actor,
        id: Uuid,
    ) -> Result<StockRequest, AppError> {
        let mut tx = pool.begin().await?;

        let request = self
            .request_repo
            .get_stock_request_for_update(&mut tx, id)
            .await?
            .ok_or(AppError::NotFound("Pedido de estoque"))?;
        if !request.status.can_fulfill() {
            return Err(Self::invalid_stock_state("atendimento", request.status));
        }

        if let Some(item_id) = request.item_id {
            let resolved = self
                .inventory_service
                .resolve(&mut tx, item_id, request.item_type.as_deref(), false)
                .await?
                .ok_or(AppError::NotFound("Item do pedido"))?;

            let quantity = request.effective_quantity();
            let credited = self
                .inventory_service
                .credit_matching(&mut *tx, &resolved, request.room_id, quantity)
                .await?;
            self.inventory_service
                .record_receipt(
                    &mut tx,
                    &credited,
                    request.room_id,
                    "Administração",
                    Some("Administration (Stock Request)"),
                    quantity,
                )
                .await?;
        }

        let request = self
            .request_repo
            .mark_stock_request_fulfilled(&mut *tx, id, actor.id)
            .await?;
        tx.commit().await?;

        Ok(request)
    }

    pub async fn get_stock_request(&self, pool: &PgPool, id: Uuid) -> Result<StockRequest, AppError> {
        self.request_repo
            .get_stock_request(pool, id)
            .await?
            .ok_or(AppError::NotFound("Pedido de estoque"))
    }

    pub async fn list_stock_requests(
        &self,
        pool: &PgPool,
        status: Option<StockRequestStatus>,
    ) -> Result<Vec<StockRequest>, AppError> {
        self.request_repo.list_stock_requests(pool, status).await
    }
}
