//! Opt-out resolution and the organisation-scoped opt-out cache.

use std::{
  collections::{HashMap, HashSet},
  sync::Arc,
  time::{Duration, Instant},
};

use canvass_core::{
  contact::{Contact, Prefetched},
  opt_out::OptOutStatus,
  store::OptOutIndex,
};
use tokio::sync::{Mutex, OnceCell};

use crate::{Backend, Error, RequestContext, Result};

// ─── Cache ───────────────────────────────────────────────────────────────────

struct CachedOrganization {
  cells:     HashSet<String>,
  loaded_at: Instant,
}

/// Process-wide cache of each organisation's opted-out cells.
///
/// The first query for an organisation loads its whole opt-out set from the
/// index; later queries answer from memory until the entry is older than
/// `ttl`. Concurrent first queries share one load.
pub struct OptOutCache<I> {
  index:   Arc<I>,
  ttl:     Duration,
  entries: Mutex<HashMap<i64, Arc<OnceCell<CachedOrganization>>>>,
}

impl<I: OptOutIndex> OptOutCache<I> {
  pub fn new(index: Arc<I>, ttl: Duration) -> Self {
    Self { index, ttl, entries: Mutex::new(HashMap::new()) }
  }

  /// Whether `cell` is opted out within `organization_id`.
  pub async fn query(&self, cell: &str, organization_id: i64) -> Result<bool> {
    let slot = {
      let mut entries = self.entries.lock().await;
      let expired = entries
        .get(&organization_id)
        .and_then(|slot| slot.get())
        .is_some_and(|cached| cached.loaded_at.elapsed() >= self.ttl);
      if expired {
        tracing::debug!(organization_id, "opt-out cache entry expired");
        entries.remove(&organization_id);
      }
      Arc::clone(entries.entry(organization_id).or_default())
    };

    let cached = slot
      .get_or_try_init(|| async {
        let cells = self
          .index
          .organization_opt_outs(organization_id)
          .await
          .map_err(Error::store)?;
        tracing::debug!(organization_id, count = cells.len(), "loaded opt-outs");
        Ok::<_, Error>(CachedOrganization { cells, loaded_at: Instant::now() })
      })
      .await?;

    Ok(cached.cells.contains(cell))
  }

  /// Drop the cached set for `organization_id`; the next query reloads it.
  pub async fn invalidate(&self, organization_id: i64) {
    self.entries.lock().await.remove(&organization_id);
  }
}

// ─── Resolver ────────────────────────────────────────────────────────────────

impl<S: Backend> RequestContext<S> {
  /// Resolve whether the contact's cell is opted out in its organisation.
  ///
  /// A batch-provided opt-out cell wins outright, then a batch-provided flag;
  /// only without either is the opt-out cache consulted.
  pub async fn opt_out(&self, contact: &Contact) -> Result<OptOutStatus> {
    if let Prefetched::Resolved(cell) = &contact.hints.opt_out_cell {
      return Ok(OptOutStatus::opted(cell.clone()));
    }

    let opted_out = match contact.hints.is_opted_out {
      Prefetched::Resolved(flag) => flag,
      Prefetched::Unresolved => {
        let organization_id = self.organization_id(contact).await?;
        self.opt_outs.query(&contact.cell, organization_id).await?
      }
    };

    Ok(if opted_out {
      OptOutStatus::opted(contact.cell.clone())
    } else {
      OptOutStatus::NotOpted
    })
  }
}
