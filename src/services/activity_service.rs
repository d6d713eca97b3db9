// src/services/activity_service.rs

use uuid::Uuid;

use crate::db::ActivityRepository;

// Canal lateral de auditoria. Escreve DEPOIS do commit da transação de
// negócio, fora dela, e engole qualquer falha: um log perdido nunca pode
// desfazer uma transição já persistida.
#[derive(Clone)]
pub struct ActivityService {
    repo: ActivityRepository,
}

impl ActivityService {
    pub fn new(repo: ActivityRepository) -> Self {
        Self { repo }
    }

    pub async fn log(&self, account_id: Uuid, action: &str, detail: &str) {
        if let Err(e) = self.repo.insert_and_prune(account_id, action, detail).await {
            tracing::warn!("Falha ao registrar atividade '{}': {}", action, e);
        }
    }
}
