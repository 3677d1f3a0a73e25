//! Evidence bundle generation.

use serde::Serialize;

use skt_core::entities::{EvidenceBundle, EvidenceItem};
use skt_core::enums::{EvidenceItemKind, EvidenceStatus};

use crate::error::DatabaseError;
use crate::helpers::now;
use crate::repos::beneficiary::BeneficiaryScope;
use crate::service::SktService;

/// Nominal size of one bundle item.
const ITEM_BYTES: u64 = 1024;

impl SktService {
    /// Collect the bundle's items and mark it READY, or FAILED with the error.
    pub async fn generate_evidence_bundle(&self, bundle_id: &str) {
        let bundle = match self.fetch_evidence_bundle(bundle_id).await {
            Ok(bundle) => bundle,
            Err(e) => {
                tracing::error!(bundle = bundle_id, error = %e, "evidence bundle not loadable");
                return;
            }
        };

        let result = match self.collect_evidence(&bundle).await {
            Ok(items) => {
                let file_size = items.len() as u64 * ITEM_BYTES;
                self.mark_evidence_ready(&bundle, &items, file_size)
                    .await
                    .map(|()| items.len())
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(count) => {
                tracing::info!(bundle = bundle_id, items = count, "evidence bundle ready");
            }
            Err(e) => {
                tracing::error!(bundle = bundle_id, error = %e, "evidence bundle generation failed");
                let message = e.to_string();
                if let Err(e) = self
                    .set_evidence_status(&bundle, EvidenceStatus::Failed, Some(&message))
                    .await
                {
                    tracing::error!(bundle = bundle_id, error = %e, "could not mark bundle failed");
                }
            }
        }
    }

    /// Programme info first, then per beneficiary its progress, placement,
    /// and beneficiary records.
    async fn collect_evidence(
        &self,
        bundle: &EvidenceBundle,
    ) -> Result<Vec<EvidenceItem>, DatabaseError> {
        let mut items = Vec::new();

        match self.get_programme(&bundle.programme_id).await {
            Ok(programme) => items.push(item(
                EvidenceItemKind::ProgrammeInfo,
                format!("programme_{}.json", bundle.programme_id),
                now(),
                &programme,
            )?),
            Err(DatabaseError::NotFound(_)) => {
                tracing::warn!(bundle = %bundle.id, "programme gone, bundle has no programme info");
            }
            Err(e) => return Err(e),
        }

        let beneficiaries = self
            .programme_beneficiaries(&bundle.programme_id, &BeneficiaryScope::default())
            .await?;
        for beneficiary in beneficiaries.iter().filter(|b| {
            bundle
                .beneficiary_id
                .as_deref()
                .is_none_or(|only| only == b.id)
        }) {
            if let Some(progress) = self.get_progress(&beneficiary.id).await? {
                items.push(item(
                    EvidenceItemKind::ProgressRecord,
                    format!("progress_{}.json", beneficiary.id),
                    progress.last_updated,
                    &progress,
                )?);
            }
            if let Some(placement) = self.latest_placement(&beneficiary.id).await? {
                items.push(item(
                    EvidenceItemKind::PlacementRecord,
                    format!("placement_{}.json", beneficiary.id),
                    placement.created_at,
                    &placement,
                )?);
            }
            items.push(item(
                EvidenceItemKind::BeneficiaryInfo,
                format!("beneficiary_{}.json", beneficiary.id),
                beneficiary.enrolled_at,
                beneficiary,
            )?);
        }

        Ok(items)
    }
}

fn item<T: Serialize>(
    kind: EvidenceItemKind,
    url: String,
    ts: chrono::DateTime<chrono::Utc>,
    record: &T,
) -> Result<EvidenceItem, DatabaseError> {
    Ok(EvidenceItem {
        kind,
        url,
        ts,
        checksum: Some(checksum(record)?),
    })
}

/// MD5 hex digest of the record's JSON.
fn checksum<T: Serialize>(record: &T) -> Result<String, DatabaseError> {
    let json = serde_json::to_vec(record)?;
    Ok(format!("{:x}", md5::compute(json)))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::jobs::spawn_evidence_bundle;
    use crate::test_support::helpers::{create_test_programme, enrol, manager, test_service};
    use pretty_assertions::assert_eq;
    use skt_core::enums::EvidenceType;
    use skt_core::validation::{NewEvidenceBundle, PlacementRequest};

    fn request(beneficiary_id: Option<String>) -> NewEvidenceBundle {
        NewEvidenceBundle {
            bundle_type: EvidenceType::Full,
            beneficiary_id,
            requested_by: "mgr-1".into(),
            expires_in_days: 7,
        }
    }

    #[tokio::test]
    async fn generates_items_in_order() {
        let svc = test_service().await;
        let programme = create_test_programme(&svc, "PSD25").await;
        let placed = enrol(&svc, &programme.id, "L1").await;
        enrol(&svc, &programme.id, "L2").await;
        let (placement, _) = PlacementRequest {
            ctc: Some(200_000.0),
            ..PlacementRequest::default()
        }
        .validate()
        .unwrap();
        svc.add_placement(&placed.id, placement, &manager()).await.unwrap();

        let bundle = svc
            .request_evidence_bundle(&programme.id, request(None), &manager())
            .await
            .unwrap();
        svc.generate_evidence_bundle(&bundle.id).await;

        let ready = svc.get_evidence_bundle(&bundle.id).await.unwrap();
        assert_eq!(ready.status, EvidenceStatus::Ready);
        let kinds: Vec<EvidenceItemKind> = ready.items.iter().map(|i| i.kind).collect();
        assert_eq!(
            kinds,
            vec![
                EvidenceItemKind::ProgrammeInfo,
                EvidenceItemKind::ProgressRecord,
                EvidenceItemKind::PlacementRecord,
                EvidenceItemKind::BeneficiaryInfo,
                EvidenceItemKind::ProgressRecord,
                EvidenceItemKind::BeneficiaryInfo,
            ]
        );
        assert_eq!(ready.items[0].url, format!("programme_{}.json", programme.id));
        assert_eq!(ready.items[3].url, format!("beneficiary_{}.json", placed.id));
        assert_eq!(ready.items[3].ts, placed.enrolled_at);
        assert!(ready.items.iter().all(|i| {
            i.checksum
                .as_deref()
                .is_some_and(|c| c.len() == 32 && c.chars().all(|ch| ch.is_ascii_hexdigit()))
        }));
        assert_eq!(ready.file_size, Some(6 * 1024));
    }

    #[tokio::test]
    async fn single_beneficiary_bundle() {
        let svc = test_service().await;
        let programme = create_test_programme(&svc, "PSD25").await;
        enrol(&svc, &programme.id, "L1").await;
        let only = enrol(&svc, &programme.id, "L2").await;

        let bundle = svc
            .request_evidence_bundle(&programme.id, request(Some(only.id.clone())), &manager())
            .await
            .unwrap();
        svc.generate_evidence_bundle(&bundle.id).await;

        let ready = svc.get_evidence_bundle(&bundle.id).await.unwrap();
        assert_eq!(ready.items.len(), 3);
        assert!(ready.items[1..].iter().all(|i| i.url.contains(&only.id)));
    }

    #[tokio::test]
    async fn checksum_is_stable() {
        let a = checksum(&serde_json::json!({"learner_id": "L1"})).unwrap();
        let b = checksum(&serde_json::json!({"learner_id": "L1"})).unwrap();
        assert_eq!(a, b);
        assert_eq!(checksum(&"").unwrap(), "9d4568c009d203ab10e33ea9953a0264");
    }

    #[tokio::test]
    async fn regenerating_a_ready_bundle_marks_nothing() {
        let svc = test_service().await;
        let programme = create_test_programme(&svc, "PSD25").await;
        let bundle = svc
            .request_evidence_bundle(&programme.id, request(None), &manager())
            .await
            .unwrap();
        svc.generate_evidence_bundle(&bundle.id).await;
        svc.generate_evidence_bundle(&bundle.id).await;

        let ready = svc.get_evidence_bundle(&bundle.id).await.unwrap();
        assert_eq!(ready.status, EvidenceStatus::Ready);
        assert_eq!(ready.error_message, None);
    }

    #[tokio::test]
    async fn spawned_job_completes() {
        let svc = Arc::new(test_service().await);
        let programme = create_test_programme(&svc, "PSD25").await;
        let bundle = svc
            .request_evidence_bundle(&programme.id, request(None), &manager())
            .await
            .unwrap();

        spawn_evidence_bundle(Arc::clone(&svc), bundle.id.clone())
            .await
            .unwrap();

        let ready = svc.get_evidence_bundle(&bundle.id).await.unwrap();
        assert_eq!(ready.status, EvidenceStatus::Ready);
        assert_eq!(ready.items.len(), 1);
    }
}
