use std::collections::{BTreeSet, HashMap};

use futures_util::{StreamExt, stream};
use uuid::Uuid;

use posts_domain::actor::{ActorField, ActorRefs, ResolvedActor};

use crate::{IdentityProvider, PostService};

/// Outcome of one enrichment round, keyed by actor id.
#[derive(Debug, Default)]
pub struct ActorDirectory {
	resolved: HashMap<Uuid, ResolvedActor>,
	unresolved: BTreeSet<Uuid>,
}
impl ActorDirectory {
	pub fn get(&self, id: Uuid) -> Option<&ResolvedActor> {
		self.resolved.get(&id)
	}

	pub fn resolved_len(&self) -> usize {
		self.resolved.len()
	}

	pub fn unresolved(&self) -> impl Iterator<Item = Uuid> + '_ {
		self.unresolved.iter().copied()
	}
}

/// A record with the actors that resolved for it.
#[derive(Clone, Debug)]
pub struct Enriched<R> {
	pub record: R,
	pub created_by: Option<ResolvedActor>,
	pub updated_by: Option<ResolvedActor>,
	pub deleted_by: Option<ResolvedActor>,
}
impl<R> Enriched<R> {
	pub fn actor(&self, field: ActorField) -> Option<&ResolvedActor> {
		match field {
			ActorField::CreatedBy => self.created_by.as_ref(),
			ActorField::UpdatedBy => self.updated_by.as_ref(),
			ActorField::DeletedBy => self.deleted_by.as_ref(),
		}
	}
}

pub fn distinct_actor_ids<R>(records: &[R], fields: &[ActorField]) -> BTreeSet<Uuid>
where
	R: ActorRefs,
{
	records
		.iter()
		.flat_map(|record| fields.iter().filter_map(|field| record.actor_ref(*field)))
		.collect()
}

/// Resolves every id once, with at most `max_concurrency` lookups in flight.
///
/// Failed and unknown ids land in the unresolved set; nothing here fails the caller.
pub async fn resolve_actors<P>(
	identity: &P,
	ids: BTreeSet<Uuid>,
	max_concurrency: usize,
) -> ActorDirectory
where
	P: IdentityProvider + ?Sized,
{
	let requested = ids.len();
	let outcomes: Vec<_> = stream::iter(ids)
		.map(|id| async move { (id, identity.resolve_actor(id).await) })
		.buffer_unordered(max_concurrency.max(1))
		.collect()
		.await;
	let mut directory = ActorDirectory::default();

	for (id, outcome) in outcomes {
		match outcome {
			Ok(Some(actor)) => {
				directory.resolved.insert(id, actor);
			},
			Ok(None) => {
				tracing::debug!(actor_id = %id, "Actor not found in identity service.");

				directory.unresolved.insert(id);
			},
			Err(err) => {
				tracing::warn!(actor_id = %id, error = %err, "Actor lookup failed.");

				directory.unresolved.insert(id);
			},
		}
	}

	tracing::debug!(
		requested,
		resolved = directory.resolved.len(),
		unresolved = directory.unresolved.len(),
		"Actor enrichment finished."
	);

	directory
}

/// Attaches resolved actors to each record. Order is preserved and no record is dropped.
pub fn merge<R>(records: Vec<R>, fields: &[ActorField], directory: &ActorDirectory) -> Vec<Enriched<R>>
where
	R: ActorRefs,
{
	records
		.into_iter()
		.map(|record| {
			let lookup = |field: ActorField| {
				if !fields.contains(&field) {
					return None;
				}

				record.actor_ref(field).and_then(|id| directory.get(id)).cloned()
			};
			let created_by = lookup(ActorField::CreatedBy);
			let updated_by = lookup(ActorField::UpdatedBy);
			let deleted_by = lookup(ActorField::DeletedBy);

			Enriched { record, created_by, updated_by, deleted_by }
		})
		.collect()
}

impl PostService {
	/// Resolves the requested actor fields across `records` in one concurrent round.
	pub async fn enrich<R>(&self, records: Vec<R>, fields: &[ActorField]) -> Vec<Enriched<R>>
	where
		R: ActorRefs,
	{
		let ids = distinct_actor_ids(&records, fields);

		if ids.is_empty() {
			return merge(records, fields, &ActorDirectory::default());
		}

		let directory =
			resolve_actors(self.identity.as_ref(), ids, self.cfg.enrichment.max_concurrency).await;

		merge(records, fields, &directory)
	}
}

#[cfg(test)]
mod tests {
	use uuid::Uuid;

	use posts_domain::actor::{ActorField, ActorRefs};

	use crate::enrich::{ActorDirectory, distinct_actor_ids, merge};

	struct Row {
		created_by: Option<Uuid>,
		updated_by: Option<Uuid>,
	}
	impl ActorRefs for Row {
		fn actor_ref(&self, field: ActorField) -> Option<Uuid> {
			match field {
				ActorField::CreatedBy => self.created_by,
				ActorField::UpdatedBy => self.updated_by,
				ActorField::DeletedBy => None,
			}
		}
	}

	#[test]
	fn distinct_ids_skip_nulls_and_repeats() {
		let a = Uuid::new_v4();
		let b = Uuid::new_v4();
		let rows = vec![
			Row { created_by: Some(a), updated_by: Some(b) },
			Row { created_by: Some(a), updated_by: None },
			Row { created_by: None, updated_by: Some(a) },
		];

		assert_eq!(distinct_actor_ids(&rows, &ActorField::ALL).len(), 2);
		assert_eq!(distinct_actor_ids(&rows, &[ActorField::UpdatedBy]).len(), 2);
		assert!(distinct_actor_ids(&rows, &[ActorField::DeletedBy]).is_empty());
	}

	#[test]
	fn merge_keeps_every_record_in_order() {
		let rows: Vec<_> = (0..4)
			.map(|_| Row { created_by: Some(Uuid::new_v4()), updated_by: None })
			.collect();
		let ids: Vec<_> = rows.iter().filter_map(|row| row.created_by).collect();
		let merged = merge(rows, &ActorField::ALL, &ActorDirectory::default());

		assert_eq!(merged.len(), 4);
		assert_eq!(merged.iter().filter_map(|row| row.record.created_by).collect::<Vec<_>>(), ids);
		assert!(merged.iter().all(|row| row.created_by.is_none()));
	}
}
