//! Batch reconciliation.

use anyhow::{Context, Result, bail};
use chrono::Utc;
use log::info;
use sqlx::{SqliteConnection, SqlitePool};
use std::sync::Arc;

use crate::items::{Item, repository as items_repo};
use crate::lists::{
    ListMember, ListResponse, MemberRole, ShoppingList, repository as lists_repo,
};
use crate::ws::{ListEvent, ListHub};

use super::types::{SyncAction, SyncOp, SyncRequest, SyncResponse, SyncResult};

struct ActionOutcome {
    result: SyncResult,
    /// Event to fan out after commit, keyed by list.
    event: Option<(String, ListEvent)>,
}

/// Applies offline batches.
///
/// A whole batch runs inside one transaction: either the database sees
/// every applied action or none of them. Individual actions still fail
/// or conflict independently; a bad action never poisons its neighbors.
#[derive(Clone)]
pub struct Reconciler {
    pool: SqlitePool,
    hub: Arc<ListHub>,
}

impl Reconciler {
    pub fn new(pool: SqlitePool, hub: Arc<ListHub>) -> Self {
        Self { pool, hub }
    }

    /// Apply a batch for the given user and report per-action verdicts.
    pub async fn process_batch(
        &self,
        user_id: &str,
        request: SyncRequest,
    ) -> Result<SyncResponse> {
        let mut actions = request.actions;
        // Replay in the order the client performed them. The sort is
        // stable, so equal timestamps keep their batch order.
        actions.sort_by_key(|a| a.client_timestamp);

        let mut results = Vec::with_capacity(actions.len());
        let mut events = Vec::new();

        let mut tx = self.pool.begin().await.context("starting sync transaction")?;

        for action in &actions {
            let outcome = match self.apply_action(&mut tx, user_id, action).await {
                Ok(outcome) => outcome,
                Err(err) => ActionOutcome {
                    result: SyncResult::failed(action, err.to_string()),
                    event: None,
                },
            };

            if let Some(event) = outcome.event {
                events.push(event);
            }
            results.push(outcome.result);
        }

        tx.commit().await.context("committing sync transaction")?;

        // Only after commit does anyone else get to hear about it.
        for (list_id, event) in &events {
            self.hub.broadcast(list_id, event);
        }

        let synced_count = results.iter().filter(|r| r.success).count();
        let conflict_count = results.iter().filter(|r| r.is_conflict()).count();
        let failed_count = results.len() - synced_count - conflict_count;

        info!(
            "sync batch for user {user_id}: {synced_count} synced, {conflict_count} conflicts, {failed_count} failed"
        );

        Ok(SyncResponse {
            results,
            server_timestamp: Utc::now(),
            synced_count,
            failed_count,
            conflict_count,
        })
    }

    async fn apply_action(
        &self,
        conn: &mut SqliteConnection,
        user_id: &str,
        action: &SyncAction,
    ) -> Result<ActionOutcome> {
        match &action.op {
            SyncOp::CreateList { payload } => {
                crate::lists::validate_list_name(&payload.name)?;
                if let Some(color) = payload.color.as_deref() {
                    crate::lists::validate_color(color)?;
                }

                let list = ShoppingList::new(
                    user_id,
                    payload.name.trim(),
                    payload.color.clone(),
                    payload.icon.clone(),
                );
                let member = ListMember::new(&list.id, user_id, MemberRole::Owner);
                lists_repo::insert_list(conn, &list).await?;
                lists_repo::insert_member(conn, &member).await?;

                Ok(ActionOutcome {
                    result: SyncResult::applied(action, Some(list.id)),
                    event: None,
                })
            }

            SyncOp::UpdateList { payload } => {
                let list_id = require_entity_id(action)?;
                let mut list = self.require_editable_list(conn, user_id, list_id).await?;

                if list.updated_at > action.client_timestamp {
                    let server = serde_json::to_value(ListResponse::from(list))?;
                    return Ok(ActionOutcome {
                        result: SyncResult::conflict(action, list_id, server),
                        event: None,
                    });
                }

                if let Some(name) = payload.name.as_deref() {
                    crate::lists::validate_list_name(name)?;
                    list.name = name.trim().to_string();
                }
                if let Some(color) = payload.color.clone() {
                    crate::lists::validate_color(&color)?;
                    list.color = color;
                }
                if let Some(icon) = payload.icon.clone() {
                    list.icon = icon;
                }
                if let Some(archived) = payload.is_archived {
                    list.is_archived = archived;
                }
                list.updated_at = Utc::now();
                lists_repo::update_list_row(conn, &list).await?;

                let event = ListEvent::ListUpdated {
                    list_id: list.id.clone(),
                    list: ListResponse::from(list.clone()),
                };
                Ok(ActionOutcome {
                    result: SyncResult::applied(action, Some(list.id.clone())),
                    event: Some((list.id, event)),
                })
            }

            SyncOp::DeleteList => {
                let list_id = require_entity_id(action)?;
                lists_repo::fetch_list(conn, list_id)
                    .await?
                    .context("list not found")?;
                let role = lists_repo::member_role(conn, list_id, user_id)
                    .await?
                    .context("you don't have access to this list")?;
                if role != MemberRole::Owner {
                    bail!("only the owner can delete this list");
                }

                lists_repo::delete_list(conn, list_id).await?;
                Ok(ActionOutcome {
                    result: SyncResult::applied(action, Some(list_id.to_string())),
                    event: Some((
                        list_id.to_string(),
                        ListEvent::ListDeleted {
                            list_id: list_id.to_string(),
                        },
                    )),
                })
            }

            SyncOp::CreateItem { payload } => {
                crate::items::validate_item_name(&payload.item.name)?;
                if let Some(quantity) = payload.item.quantity {
                    crate::items::validate_quantity(quantity)?;
                }
                self.require_editable_list(conn, user_id, &payload.list_id)
                    .await?;

                let item = Item::new(&payload.list_id, user_id, &payload.item);
                items_repo::insert_item(conn, &item).await?;

                let event = ListEvent::ItemAdded {
                    list_id: item.list_id.clone(),
                    item: item.clone(),
                };
                Ok(ActionOutcome {
                    result: SyncResult::applied(action, Some(item.id.clone())),
                    event: Some((item.list_id, event)),
                })
            }

            SyncOp::UpdateItem { payload } => {
                let item_id = require_entity_id(action)?;
                let mut item = items_repo::fetch_item(conn, item_id)
                    .await?
                    .context("item not found")?;
                self.require_editable_list(conn, user_id, &item.list_id)
                    .await?;

                // An item edited on the server after this action was
                // queued wins; the client gets the server copy back.
                if item.updated_at > action.client_timestamp {
                    let server = serde_json::to_value(&item)?;
                    return Ok(ActionOutcome {
                        result: SyncResult::conflict(action, item_id, server),
                        event: None,
                    });
                }

                if let Some(name) = payload.name.as_deref() {
                    crate::items::validate_item_name(name)?;
                }
                if let Some(quantity) = payload.quantity {
                    crate::items::validate_quantity(quantity)?;
                }
                item.apply(payload, user_id, Utc::now());
                items_repo::update_item_row(conn, &item).await?;

                let event = ListEvent::ItemUpdated {
                    list_id: item.list_id.clone(),
                    item: item.clone(),
                };
                Ok(ActionOutcome {
                    result: SyncResult::applied(action, Some(item.id.clone())),
                    event: Some((item.list_id, event)),
                })
            }

            SyncOp::DeleteItem => {
                let item_id = require_entity_id(action)?;
                let item = items_repo::fetch_item(conn, item_id)
                    .await?
                    .context("item not found")?;
                self.require_editable_list(conn, user_id, &item.list_id)
                    .await?;

                // Deletes are not timestamp-checked: a delete queued
                // offline beats later edits, matching the clients'
                // expectation that removal is final.
                items_repo::delete_item(conn, item_id).await?;

                let event = ListEvent::ItemDeleted {
                    list_id: item.list_id.clone(),
                    item_id: item.id.clone(),
                };
                Ok(ActionOutcome {
                    result: SyncResult::applied(action, Some(item.id)),
                    event: Some((item.list_id, event)),
                })
            }
        }
    }

    async fn require_editable_list(
        &self,
        conn: &mut SqliteConnection,
        user_id: &str,
        list_id: &str,
    ) -> Result<ShoppingList> {
        let list = lists_repo::fetch_list(conn, list_id)
            .await?
            .context("list not found")?;
        let role = lists_repo::member_role(conn, list_id, user_id)
            .await?
            .context("you don't have access to this list")?;
        if !role.can_edit() {
            bail!("you don't have permission to edit this list");
        }
        Ok(list)
    }
}

fn require_entity_id(action: &SyncAction) -> Result<&str> {
    action
        .entity_id
        .as_deref()
        .context("missing entity_id for action")
}
