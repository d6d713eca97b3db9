// Cenários de ponta a ponta das máquinas de estado, contra um Postgres
// migrado. Rodam com `cargo test -- --ignored` e DATABASE_URL apontando
// para um banco de testes (o #[sqlx::test] cria um schema por teste).

use sqlx::PgPool;
use uuid::Uuid;

use almoxarifado_backend::{
    common::error::AppError,
    db::{
        ActivityRepository, BorrowRepository, InventoryRepository, RequestRepository,
        RoomRepository, TransferRepository,
    },
    models::{
        auth::{Actor, Role},
        borrow::BorrowStatus,
        inventory::VariantSpec,
        request::{DetailDecision, ItemRequestStatus, StockRequestStatus},
        transfer::TransferStatus,
    },
    services::{
        request_service::NewRequestLine, ActivityService, BorrowService, InventoryService,
        RequestService, TransferService,
    },
};

struct Fixtures {
    admin: Actor,
    requester: Actor,
    r1_in_charge: Actor,
    r2_in_charge: Actor,
    room1: Uuid,
    room2: Uuid,
}

struct Services {
    inventory: InventoryService,
    borrow: BorrowService,
    transfer: TransferService,
    request: RequestService,
}

fn build_services(pool: &PgPool) -> Services {
    let inventory_repo = InventoryRepository::new(pool.clone());
    let room_repo = RoomRepository::new(pool.clone());
    let activity = ActivityService::new(ActivityRepository::new(pool.clone()));
    let inventory = InventoryService::new(inventory_repo, room_repo.clone(), activity.clone());
    Services {
        inventory: inventory.clone(),
        borrow: BorrowService::new(
            BorrowRepository::new(pool.clone()),
            room_repo.clone(),
            inventory.clone(),
            activity.clone(),
        ),
        transfer: TransferService::new(
            TransferRepository::new(pool.clone()),
            room_repo.clone(),
            inventory.clone(),
            activity.clone(),
        ),
        request: RequestService::new(
            RequestRepository::new(pool.clone()),
            room_repo,
            inventory,
            activity,
        ),
    }
}

async fn create_account(pool: &PgPool, name: &str, role: Role) -> Actor {
    let id: Uuid = sqlx::query_scalar(
        "INSERT INTO accounts (name, email, role) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(name)
    .bind(format!("{}@escola.test", name))
    .bind(role)
    .fetch_one(pool)
    .await
    .expect("falha ao criar conta");
    Actor { id, role }
}

async fn create_stockroom(pool: &PgPool, name: &str, in_charge: Uuid) -> Uuid {
    sqlx::query_scalar(
        r#"
        INSERT INTO rooms (name, room_type, stockroom_type, room_in_charge)
        VALUES ($1, 'stockroom', 'apparel', $2)
        RETURNING id
        "#,
    )
    .bind(name)
    .bind(in_charge)
    .fetch_one(pool)
    .await
    .expect("falha ao criar sala")
}

async fn seed(pool: &PgPool) -> Fixtures {
    let admin = create_account(pool, "admin", Role::Admin).await;
    let requester = create_account(pool, "solicitante", Role::Personnel).await;
    let r1_in_charge = create_account(pool, "resp-r1", Role::Personnel).await;
    let r2_in_charge = create_account(pool, "resp-r2", Role::Personnel).await;
    let room1 = create_stockroom(pool, "Almoxarifado Central", r1_in_charge.id).await;
    let room2 = create_stockroom(pool, "Subestoque Bloco B", r2_in_charge.id).await;
    Fixtures {
        admin,
        requester,
        r1_in_charge,
        r2_in_charge,
        room1,
        room2,
    }
}

fn camisa(size: &str) -> VariantSpec {
    VariantSpec::Apparel {
        apparel_type: "Camisa".into(),
        apparel_for: "Educação Física".into(),
        size: size.into(),
    }
}

async fn apparel_total(pool: &PgPool, inventory_id: Uuid) -> i32 {
    sqlx::query_scalar("SELECT total_quantity FROM apparel_inventories WHERE id = $1")
        .bind(inventory_id)
        .fetch_one(pool)
        .await
        .expect("registro de inventário sumiu")
}

// --- Cenário A + round-trip: aprovar, retirar e devolver restaura o saldo ---
#[sqlx::test]
#[ignore]
async fn emprestimo_debita_na_retirada_e_credita_na_devolucao(pool: PgPool) {
    let fx = seed(&pool).await;
    let svc = build_services(&pool);

    let (inv, _batch) = svc
        .inventory
        .receive_stock(&pool, fx.admin, fx.room1, camisa("M"), 5, "Fornecedor", None)
        .await
        .unwrap();

    let borrow = svc
        .borrow
        .create(&pool, fx.requester, fx.room1, Some(inv.id()), Some("apparel"), 2, None)
        .await
        .unwrap();
    assert_eq!(borrow.status, BorrowStatus::WaitingForApproval);

    let borrow = svc.borrow.approve(&pool, fx.r1_in_charge, borrow.id).await.unwrap();
    assert_eq!(borrow.status, BorrowStatus::Approved);

    let borrow = svc.borrow.acquire(&pool, fx.requester, borrow.id).await.unwrap();
    assert_eq!(borrow.status, BorrowStatus::Acquired);
    assert_eq!(apparel_total(&pool, inv.id()).await, 3);

    // Round-trip: devolução aceita restaura o saldo original.
    let borrow = svc
        .borrow
        .start_return(&pool, fx.requester, borrow.id, Some("tudo em ordem"))
        .await
        .unwrap();
    assert_eq!(borrow.status, BorrowStatus::InReturn);

    let borrow = svc
        .borrow
        .accept_return(&pool, fx.r1_in_charge, borrow.id)
        .await
        .unwrap();
    assert_eq!(borrow.status, BorrowStatus::ReturnAccepted);
    assert_eq!(apparel_total(&pool, inv.id()).await, 5);
}

// --- Conformidade: transição fora de ordem falha e não muda nada ---
#[sqlx::test]
#[ignore]
async fn retirada_sem_aprovacao_falha_com_invalid_state(pool: PgPool) {
    let fx = seed(&pool).await;
    let svc = build_services(&pool);

    let (inv, _) = svc
        .inventory
        .receive_stock(&pool, fx.admin, fx.room1, camisa("G"), 5, "Fornecedor", None)
        .await
        .unwrap();

    let borrow = svc
        .borrow
        .create(&pool, fx.requester, fx.room1, Some(inv.id()), Some("apparel"), 2, None)
        .await
        .unwrap();

    let err = svc.borrow.acquire(&pool, fx.requester, borrow.id).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)));

    // Nada mudou: nem o saldo, nem o status.
    assert_eq!(apparel_total(&pool, inv.id()).await, 5);
    let unchanged = svc.borrow.get(&pool, borrow.id).await.unwrap();
    assert_eq!(unchanged.status, BorrowStatus::WaitingForApproval);
}

// --- Cenário B: duas retiradas concorrentes, só uma vence ---
#[sqlx::test]
#[ignore]
async fn retiradas_concorrentes_nao_debitam_duas_vezes(pool: PgPool) {
    let fx = seed(&pool).await;
    let svc = build_services(&pool);

    let (inv, _) = svc
        .inventory
        .receive_stock(&pool, fx.admin, fx.room1, camisa("P"), 1, "Fornecedor", None)
        .await
        .unwrap();

    let b1 = svc
        .borrow
        .create(&pool, fx.requester, fx.room1, Some(inv.id()), Some("apparel"), 1, None)
        .await
        .unwrap();
    let b2 = svc
        .borrow
        .create(&pool, fx.requester, fx.room1, Some(inv.id()), Some("apparel"), 1, None)
        .await
        .unwrap();
    svc.borrow.approve(&pool, fx.r1_in_charge, b1.id).await.unwrap();
    svc.borrow.approve(&pool, fx.r1_in_charge, b2.id).await.unwrap();

    let (first, second) = tokio::join!(
        svc.borrow.acquire(&pool, fx.requester, b1.id),
        svc.borrow.acquire(&pool, fx.requester, b2.id),
    );

    let successes = [&first, &second].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exatamente uma retirada deve vencer");

    let failure = if first.is_err() { first } else { second };
    assert!(matches!(
        failure.unwrap_err(),
        AppError::InsufficientStock { available: 0, requested: 1 }
    ));
    assert_eq!(apparel_total(&pool, inv.id()).await, 0);
}

// --- Cenário C: transferência conserva a soma entre as salas ---
#[sqlx::test]
#[ignore]
async fn transferencia_move_estoque_e_registra_lote_no_destino(pool: PgPool) {
    let fx = seed(&pool).await;
    let svc = build_services(&pool);

    let (inv, _) = svc
        .inventory
        .receive_stock(&pool, fx.admin, fx.room1, camisa("M"), 3, "Fornecedor", None)
        .await
        .unwrap();

    let transfer = svc
        .transfer
        .create(&pool, fx.r1_in_charge, fx.room1, fx.room2, "apparel", inv.id(), 2, None)
        .await
        .unwrap();
    assert_eq!(transfer.status, TransferStatus::InTransfer);

    let transfer = svc.transfer.accept(&pool, fx.admin, transfer.id).await.unwrap();
    assert_eq!(transfer.status, TransferStatus::TransferAccepted);

    assert_eq!(apparel_total(&pool, inv.id()).await, 1);

    // Mesma variante na sala de destino, com +2.
    let dest_total: i32 = sqlx::query_scalar(
        r#"
        SELECT total_quantity FROM apparel_inventories
        WHERE room_id = $1 AND apparel_type = 'Camisa'
          AND apparel_for = 'Educação Física' AND size = 'M'
        "#,
    )
    .bind(fx.room2)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(dest_total, 2);

    // Um lote de entrada no destino, com 2 unidades rastreadas.
    let units: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(u.id) FROM batch_units u
        JOIN receipt_batches b ON u.batch_id = b.id
        WHERE b.room_id = $1
        "#,
    )
    .bind(fx.room2)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(units, 2);
}

// --- Item fora da sala de origem: a criação falha com ItemNotInRoom ---
#[sqlx::test]
#[ignore]
async fn transferencia_de_item_de_outra_sala_falha(pool: PgPool) {
    let fx = seed(&pool).await;
    let svc = build_services(&pool);

    // O item existe, mas na sala 2.
    let (inv, _) = svc
        .inventory
        .receive_stock(&pool, fx.admin, fx.room2, camisa("M"), 3, "Fornecedor", None)
        .await
        .unwrap();

    let err = svc
        .transfer
        .create(&pool, fx.r1_in_charge, fx.room1, fx.room2, "apparel", inv.id(), 1, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ItemNotInRoom));
}

// --- Cenário D: release granular debita só a linha aceita ---
#[sqlx::test]
#[ignore]
async fn release_debita_somente_linhas_aceitas(pool: PgPool) {
    let fx = seed(&pool).await;
    let svc = build_services(&pool);

    let (inv_a, _) = svc
        .inventory
        .receive_stock(&pool, fx.admin, fx.room1, camisa("M"), 10, "Fornecedor", None)
        .await
        .unwrap();
    let (inv_b, _) = svc
        .inventory
        .receive_stock(&pool, fx.admin, fx.room1, camisa("G"), 10, "Fornecedor", None)
        .await
        .unwrap();

    let request = svc
        .request
        .create_item_request(
            &pool,
            fx.r2_in_charge,
            fx.room2,
            fx.room1,
            None,
            vec![
                NewRequestLine {
                    item_id: Some(inv_a.id()),
                    item_type: Some("apparel".into()),
                    other_item_name: None,
                    quantity: 4,
                },
                NewRequestLine {
                    item_id: Some(inv_b.id()),
                    item_type: Some("apparel".into()),
                    other_item_name: None,
                    quantity: 2,
                },
            ],
        )
        .await
        .unwrap();

    let accepted_line = request.details[0].id;
    let declined_line = request.details[1].id;
    let request = svc
        .request
        .accept_item_request(
            &pool,
            fx.r1_in_charge,
            request.header.id,
            Some(vec![
                DetailDecision { detail_id: accepted_line, accept: true },
                DetailDecision { detail_id: declined_line, accept: false },
            ]),
        )
        .await
        .unwrap();
    assert_eq!(request.header.status, ItemRequestStatus::Accepted);

    let request = svc
        .request
        .release_item_request(&pool, fx.r1_in_charge, request.header.id)
        .await
        .unwrap();
    assert_eq!(request.header.status, ItemRequestStatus::Released);

    // Só a linha aceita saiu do estoque do fornecedor.
    assert_eq!(apparel_total(&pool, inv_a.id()).await, 6);
    assert_eq!(apparel_total(&pool, inv_b.id()).await, 10);

    let released = request
        .details
        .iter()
        .find(|d| d.id == accepted_line)
        .unwrap();
    assert_eq!(released.status, ItemRequestStatus::Released);
    let declined = request
        .details
        .iter()
        .find(|d| d.id == declined_line)
        .unwrap();
    assert_eq!(declined.status, ItemRequestStatus::Declined);

    // O fulfill credita a sala requerente e marca a proveniência no lote.
    let request = svc
        .request
        .fulfill_item_request(&pool, fx.r2_in_charge, request.header.id)
        .await
        .unwrap();
    assert_eq!(request.header.status, ItemRequestStatus::Fulfilled);

    let dest_total: i32 = sqlx::query_scalar(
        r#"
        SELECT total_quantity FROM apparel_inventories
        WHERE room_id = $1 AND size = 'M'
        "#,
    )
    .bind(fx.room2)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(dest_total, 4);

    let provenance: String = sqlx::query_scalar(
        "SELECT source FROM receipt_batches WHERE room_id = $1 LIMIT 1",
    )
    .bind(fx.room2)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(provenance, format!("ItemRequest #{}", request.header.id));
}

// --- Release sem estoque: rollback completo + out_of_stock registrado ---
#[sqlx::test]
#[ignore]
async fn release_sem_estoque_aborta_tudo_e_marca_out_of_stock(pool: PgPool) {
    let fx = seed(&pool).await;
    let svc = build_services(&pool);

    let (inv_a, _) = svc
        .inventory
        .receive_stock(&pool, fx.admin, fx.room1, camisa("M"), 10, "Fornecedor", None)
        .await
        .unwrap();
    let (inv_b, _) = svc
        .inventory
        .receive_stock(&pool, fx.admin, fx.room1, camisa("G"), 1, "Fornecedor", None)
        .await
        .unwrap();

    let request = svc
        .request
        .create_item_request(
            &pool,
            fx.r2_in_charge,
            fx.room2,
            fx.room1,
            None,
            vec![
                NewRequestLine {
                    item_id: Some(inv_a.id()),
                    item_type: Some("apparel".into()),
                    other_item_name: None,
                    quantity: 4,
                },
                NewRequestLine {
                    item_id: Some(inv_b.id()),
                    item_type: Some("apparel".into()),
                    other_item_name: None,
                    quantity: 5, // só existe 1
                },
            ],
        )
        .await
        .unwrap();

    svc.request
        .accept_item_request(&pool, fx.r1_in_charge, request.header.id, None)
        .await
        .unwrap();

    let err = svc
        .request
        .release_item_request(&pool, fx.r1_in_charge, request.header.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InsufficientStock { available: 1, requested: 5 }));

    // Sem liberação parcial: a primeira linha também não foi debitada.
    assert_eq!(apparel_total(&pool, inv_a.id()).await, 10);
    assert_eq!(apparel_total(&pool, inv_b.id()).await, 1);

    // A tentativa falhada fica visível, em transação própria.
    let request = svc.request.get_item_request(&pool, request.header.id).await.unwrap();
    assert_eq!(request.header.status, ItemRequestStatus::OutOfStock);
}

// --- Cenário E: pedido de estoque de item avulso não toca o inventário ---
#[sqlx::test]
#[ignore]
async fn pedido_de_estoque_avulso_so_avanca_o_status(pool: PgPool) {
    let fx = seed(&pool).await;
    let svc = build_services(&pool);

    let request = svc
        .request
        .create_stock_request(
            &pool,
            fx.r2_in_charge,
            fx.room2,
            None,
            None,
            Some("Extintor de incêndio"),
            3,
            None,
        )
        .await
        .unwrap();
    assert_eq!(request.status, StockRequestStatus::Pending);

    // O aprovador emenda a quantidade de 3 para 2.
    let request = svc
        .request
        .approve_stock_request(&pool, fx.admin, request.id, Some(2))
        .await
        .unwrap();
    assert_eq!(request.status, StockRequestStatus::Approved);
    assert_eq!(request.effective_quantity(), 2);

    let request = svc
        .request
        .fulfill_stock_request(&pool, fx.admin, request.id)
        .await
        .unwrap();
    assert_eq!(request.status, StockRequestStatus::Fulfilled);

    // Nenhum registro de inventário nem lote foi criado.
    let inventories: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM gen_item_inventories")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(inventories, 0);
    let batches: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM receipt_batches")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(batches, 0);
}

// --- Pedido de estoque de item do catálogo credita a sala requerente ---
#[sqlx::test]
#[ignore]
async fn pedido_de_estoque_de_catalogo_credita_a_sala(pool: PgPool) {
    let fx = seed(&pool).await;
    let svc = build_services(&pool);

    // Catálogo da administração: a variante existe no estoque central.
    let (inv, _) = svc
        .inventory
        .receive_stock(&pool, fx.admin, fx.room1, camisa("M"), 50, "Fornecedor", None)
        .await
        .unwrap();

    let request = svc
        .request
        .create_stock_request(
            &pool,
            fx.r2_in_charge,
            fx.room2,
            Some(inv.id()),
            Some("apparel"),
            None,
            10,
            None,
        )
        .await
        .unwrap();

    let request = svc
        .request
        .approve_stock_request(&pool, fx.admin, request.id, None)
        .await
        .unwrap();
    let request = svc
        .request
        .fulfill_stock_request(&pool, fx.admin, request.id)
        .await
        .unwrap();
    assert_eq!(request.status, StockRequestStatus::Fulfilled);

    let dest_total: i32 = sqlx::query_scalar(
        "SELECT total_quantity FROM apparel_inventories WHERE room_id = $1 AND size = 'M'",
    )
    .bind(fx.room2)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(dest_total, 10);

    let provenance: String = sqlx::query_scalar(
        "SELECT source FROM receipt_batches WHERE room_id = $1",
    )
    .bind(fx.room2)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(provenance, "Administration (Stock Request)");
}

// --- Log de atividades: retenção de 100 entradas por conta ---
#[sqlx::test]
#[ignore]
async fn log_de_atividades_poda_alem_de_100(pool: PgPool) {
    let fx = seed(&pool).await;
    let activity = ActivityService::new(ActivityRepository::new(pool.clone()));

    for i in 0..105 {
        activity
            .log(fx.admin.id, "TESTE", &format!("entrada {}", i))
            .await;
    }

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM activity_logs WHERE account_id = $1")
        .bind(fx.admin.id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 100);
}
