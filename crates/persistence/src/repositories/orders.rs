//! Order repository, including the status-change audit trail.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use domain::error::DomainError;
use domain::events::{ChangeEvent, ChangeKind};
use domain::models::order::{CreateOrderInput, UpdateOrderInput};
use domain::models::{Order, StatusChange};

use crate::entities::{OrderEntity, StatusChangeEntity};
use crate::events::ChangeHub;
use crate::metrics::QueryTimer;
use crate::repositories::map_db_err;

/// Repository for orders.
///
/// Every committed insert or update is published on the change hub. Audit
/// entries are appended separately from the status write; the caller owns
/// the ordering between the two.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Creates an order. The acting staff member becomes both the assigned
    /// employee and the creator.
    async fn insert(&self, input: &CreateOrderInput, actor: Uuid) -> Result<Order, DomainError>;

    /// Applies a partial update. Status transitions go through `set_status`.
    async fn update(&self, id: Uuid, input: &UpdateOrderInput) -> Result<Order, DomainError>;

    /// Moves the order to another status and bumps `updated_at`.
    async fn set_status(&self, id: Uuid, status_id: Uuid) -> Result<Order, DomainError>;

    async fn find(&self, id: Uuid) -> Result<Option<Order>, DomainError>;

    /// All orders, ascending by delivery date.
    async fn list(&self) -> Result<Vec<Order>, DomainError>;

    /// Orders with a delivery date inside `[start, end)`, ascending.
    async fn list_in_window(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Order>, DomainError>;

    /// Appends one audit entry. Values are frozen display strings.
    async fn append_status_change(
        &self,
        order_id: Uuid,
        changed_by: Uuid,
        field_name: &str,
        old_value: &str,
        new_value: &str,
    ) -> Result<StatusChange, DomainError>;

    /// Audit trail for an order, oldest first.
    async fn history(&self, order_id: Uuid) -> Result<Vec<StatusChange>, DomainError>;
}

/// Postgres-backed order repository.
#[derive(Clone)]
pub struct PgOrderRepository {
    pool: PgPool,
    hub: Arc<ChangeHub>,
}

impl PgOrderRepository {
    pub fn new(pool: PgPool, hub: Arc<ChangeHub>) -> Self {
        Self { pool, hub }
    }
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn insert(&self, input: &CreateOrderInput, actor: Uuid) -> Result<Order, DomainError> {
        let timer = QueryTimer::new("order_insert");
        let result = sqlx::query_as::<_, OrderEntity>(
            r#"
            INSERT INTO orders (id, client_id, service, description, status_id,
                                delivery_date, employee_id, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
            RETURNING id, client_id, service, description, status_id, delivery_date,
                      employee_id, created_by, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(input.client_id)
        .bind(&input.service)
        .bind(&input.description)
        .bind(input.status_id)
        .bind(input.delivery_date)
        .bind(actor)
        .fetch_one(&self.pool)
        .await;
        timer.record();

        let order = result.map(OrderEntity::into_domain).map_err(map_db_err)?;
        self.hub.publish(ChangeEvent::Orders {
            kind: ChangeKind::Insert,
            record: order.clone(),
        });
        Ok(order)
    }

    async fn update(&self, id: Uuid, input: &UpdateOrderInput) -> Result<Order, DomainError> {
        let timer = QueryTimer::new("order_update");
        let result = sqlx::query_as::<_, OrderEntity>(
            r#"
            UPDATE orders
            SET client_id = COALESCE($2, client_id),
                service = COALESCE($3, service),
                description = COALESCE($4, description),
                delivery_date = COALESCE($5, delivery_date),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, client_id, service, description, status_id, delivery_date,
                      employee_id, created_by, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(input.client_id)
        .bind(&input.service)
        .bind(&input.description)
        .bind(input.delivery_date)
        .fetch_one(&self.pool)
        .await;
        timer.record();

        let order = result.map(OrderEntity::into_domain).map_err(map_db_err)?;
        self.hub.publish(ChangeEvent::Orders {
            kind: ChangeKind::Update,
            record: order.clone(),
        });
        Ok(order)
    }

    async fn set_status(&self, id: Uuid, status_id: Uuid) -> Result<Order, DomainError> {
        let timer = QueryTimer::new("order_set_status");
        let result = sqlx::query_as::<_, OrderEntity>(
            r#"
            UPDATE orders
            SET status_id = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, client_id, service, description, status_id, delivery_date,
                      employee_id, created_by, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(status_id)
        .fetch_one(&self.pool)
        .await;
        timer.record();

        let order = result.map(OrderEntity::into_domain).map_err(map_db_err)?;
        self.hub.publish(ChangeEvent::Orders {
            kind: ChangeKind::Update,
            record: order.clone(),
        });
        Ok(order)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Order>, DomainError> {
        let timer = QueryTimer::new("order_find");
        let result = sqlx::query_as::<_, OrderEntity>(
            r#"
            SELECT id, client_id, service, description, status_id, delivery_date,
                   employee_id, created_by, created_at, updated_at
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        result
            .map(|row| row.map(OrderEntity::into_domain))
            .map_err(map_db_err)
    }

    async fn list(&self) -> Result<Vec<Order>, DomainError> {
        let timer = QueryTimer::new("order_list");
        let result = sqlx::query_as::<_, OrderEntity>(
            r#"
            SELECT id, client_id, service, description, status_id, delivery_date,
                   employee_id, created_by, created_at, updated_at
            FROM orders
            ORDER BY delivery_date
            "#,
        )
        .fetch_all(&self.pool)
        .await;
        timer.record();

        result
            .map(|rows| rows.into_iter().map(OrderEntity::into_domain).collect())
            .map_err(map_db_err)
    }

    async fn list_in_window(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Order>, DomainError> {
        let timer = QueryTimer::new("order_list_in_window");
        let result = sqlx::query_as::<_, OrderEntity>(
            r#"
            SELECT id, client_id, service, description, status_id, delivery_date,
                   employee_id, created_by, created_at, updated_at
            FROM orders
            WHERE delivery_date >= $1 AND delivery_date < $2
            ORDER BY delivery_date
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await;
        timer.record();

        result
            .map(|rows| rows.into_iter().map(OrderEntity::into_domain).collect())
            .map_err(map_db_err)
    }

    async fn append_status_change(
        &self,
        order_id: Uuid,
        changed_by: Uuid,
        field_name: &str,
        old_value: &str,
        new_value: &str,
    ) -> Result<StatusChange, DomainError> {
        let timer = QueryTimer::new("status_change_insert");
        let result = sqlx::query_as::<_, StatusChangeEntity>(
            r#"
            INSERT INTO status_changes (id, order_id, changed_by, field_name, old_value, new_value)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, order_id, changed_by, field_name, old_value, new_value, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(order_id)
        .bind(changed_by)
        .bind(field_name)
        .bind(old_value)
        .bind(new_value)
        .fetch_one(&self.pool)
        .await;
        timer.record();

        result
            .map(StatusChangeEntity::into_domain)
            .map_err(map_db_err)
    }

    async fn history(&self, order_id: Uuid) -> Result<Vec<StatusChange>, DomainError> {
        let timer = QueryTimer::new("status_change_history");
        let result = sqlx::query_as::<_, StatusChangeEntity>(
            r#"
            SELECT id, order_id, changed_by, field_name, old_value, new_value, created_at
            FROM status_changes
            WHERE order_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();

        result
            .map(|rows| {
                rows.into_iter()
                    .map(StatusChangeEntity::into_domain)
                    .collect()
            })
            .map_err(map_db_err)
    }
}

/// In-memory order repository for tests.
pub struct MemOrderRepository {
    orders: RwLock<HashMap<Uuid, Order>>,
    changes: RwLock<Vec<StatusChange>>,
    hub: Arc<ChangeHub>,
}

impl MemOrderRepository {
    pub fn new(hub: Arc<ChangeHub>) -> Self {
        Self {
            orders: RwLock::new(HashMap::new()),
            changes: RwLock::new(Vec::new()),
            hub,
        }
    }
}

#[async_trait]
impl OrderRepository for MemOrderRepository {
    async fn insert(&self, input: &CreateOrderInput, actor: Uuid) -> Result<Order, DomainError> {
        let now = Utc::now();
        let order = Order {
            id: Uuid::new_v4(),
            client_id: input.client_id,
            service: input.service.clone(),
            description: input.description.clone(),
            status_id: input.status_id,
            delivery_date: input.delivery_date,
            employee_id: actor,
            created_by: actor,
            created_at: now,
            updated_at: now,
        };
        self.orders.write().await.insert(order.id, order.clone());
        self.hub.publish(ChangeEvent::Orders {
            kind: ChangeKind::Insert,
            record: order.clone(),
        });
        Ok(order)
    }

    async fn update(&self, id: Uuid, input: &UpdateOrderInput) -> Result<Order, DomainError> {
        let mut orders = self.orders.write().await;
        let order = orders
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found(format!("Order {}", id)))?;

        if let Some(client_id) = input.client_id {
            order.client_id = client_id;
        }
        if let Some(service) = &input.service {
            order.service = service.clone();
        }
        if let Some(description) = &input.description {
            order.description = Some(description.clone());
        }
        if let Some(delivery_date) = input.delivery_date {
            order.delivery_date = delivery_date;
        }
        order.updated_at = Utc::now();

        let order = order.clone();
        drop(orders);
        self.hub.publish(ChangeEvent::Orders {
            kind: ChangeKind::Update,
            record: order.clone(),
        });
        Ok(order)
    }

    async fn set_status(&self, id: Uuid, status_id: Uuid) -> Result<Order, DomainError> {
        let mut orders = self.orders.write().await;
        let order = orders
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found(format!("Order {}", id)))?;
        order.status_id = status_id;
        order.updated_at = Utc::now();

        let order = order.clone();
        drop(orders);
        self.hub.publish(ChangeEvent::Orders {
            kind: ChangeKind::Update,
            record: order.clone(),
        });
        Ok(order)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Order>, DomainError> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Order>, DomainError> {
        let orders = self.orders.read().await;
        let mut result: Vec<Order> = orders.values().cloned().collect();
        result.sort_by_key(|o| o.delivery_date);
        Ok(result)
    }

    async fn list_in_window(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Order>, DomainError> {
        let orders = self.orders.read().await;
        let mut result: Vec<Order> = orders
            .values()
            .filter(|o| o.delivery_date >= start && o.delivery_date < end)
            .cloned()
            .collect();
        result.sort_by_key(|o| o.delivery_date);
        Ok(result)
    }

    async fn append_status_change(
        &self,
        order_id: Uuid,
        changed_by: Uuid,
        field_name: &str,
        old_value: &str,
        new_value: &str,
    ) -> Result<StatusChange, DomainError> {
        if !self.orders.read().await.contains_key(&order_id) {
            return Err(DomainError::not_found(format!("Order {}", order_id)));
        }

        let change = StatusChange {
            id: Uuid::new_v4(),
            order_id,
            changed_by,
            field_name: field_name.to_string(),
            old_value: old_value.to_string(),
            new_value: new_value.to_string(),
            created_at: Utc::now(),
        };
        self.changes.write().await.push(change.clone());
        Ok(change)
    }

    async fn history(&self, order_id: Uuid) -> Result<Vec<StatusChange>, DomainError> {
        let changes = self.changes.read().await;
        Ok(changes
            .iter()
            .filter(|c| c.order_id == order_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use domain::models::order::STATUS_FIELD;

    fn input(delivery_date: DateTime<Utc>) -> CreateOrderInput {
        CreateOrderInput {
            client_id: Uuid::new_v4(),
            service: "Banner 2x1m".to_string(),
            description: None,
            status_id: Uuid::new_v4(),
            delivery_date,
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_actor_as_employee_and_creator() {
        let repo = MemOrderRepository::new(Arc::new(ChangeHub::new()));
        let actor = Uuid::new_v4();
        let order = repo.insert(&input(Utc::now()), actor).await.unwrap();

        assert_eq!(order.employee_id, actor);
        assert_eq!(order.created_by, actor);
    }

    #[tokio::test]
    async fn test_insert_publishes_on_change_feed() {
        let hub = Arc::new(ChangeHub::new());
        let repo = MemOrderRepository::new(hub.clone());
        let mut sub = hub.subscribe();

        let order = repo.insert(&input(Utc::now()), Uuid::new_v4()).await.unwrap();

        let events = sub.drain();
        assert_eq!(events.len(), 1);
        match &events[0] {
            ChangeEvent::Orders { kind, record } => {
                assert_eq!(*kind, ChangeKind::Insert);
                assert_eq!(record.id, order.id);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_list_sorts_by_delivery_date() {
        let repo = MemOrderRepository::new(Arc::new(ChangeHub::new()));
        let actor = Uuid::new_v4();
        let later = repo
            .insert(&input(Utc::now() + Duration::days(5)), actor)
            .await
            .unwrap();
        let sooner = repo
            .insert(&input(Utc::now() + Duration::days(1)), actor)
            .await
            .unwrap();

        let listed = repo.list().await.unwrap();
        assert_eq!(listed[0].id, sooner.id);
        assert_eq!(listed[1].id, later.id);
    }

    #[tokio::test]
    async fn test_window_is_half_open() {
        let repo = MemOrderRepository::new(Arc::new(ChangeHub::new()));
        let actor = Uuid::new_v4();
        let start = Utc::now();
        let end = start + Duration::days(30);

        let inside = repo.insert(&input(start), actor).await.unwrap();
        repo.insert(&input(end), actor).await.unwrap();

        let listed = repo.list_in_window(start, end).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, inside.id);
    }

    #[tokio::test]
    async fn test_set_status_publishes_update() {
        let hub = Arc::new(ChangeHub::new());
        let repo = MemOrderRepository::new(hub.clone());
        let order = repo.insert(&input(Utc::now()), Uuid::new_v4()).await.unwrap();

        let mut sub = hub.subscribe();
        let new_status = Uuid::new_v4();
        let updated = repo.set_status(order.id, new_status).await.unwrap();

        assert_eq!(updated.status_id, new_status);
        assert!(updated.updated_at >= order.updated_at);
        let events = sub.drain();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind(), ChangeKind::Update);
    }

    #[tokio::test]
    async fn test_history_keeps_append_order() {
        let repo = MemOrderRepository::new(Arc::new(ChangeHub::new()));
        let actor = Uuid::new_v4();
        let order = repo.insert(&input(Utc::now()), actor).await.unwrap();

        repo.append_status_change(order.id, actor, STATUS_FIELD, "Em produção", "Finalizado")
            .await
            .unwrap();
        repo.append_status_change(order.id, actor, STATUS_FIELD, "Finalizado", "Cancelado")
            .await
            .unwrap();

        let history = repo.history(order.id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].new_value, "Finalizado");
        assert_eq!(history[1].new_value, "Cancelado");
    }

    #[tokio::test]
    async fn test_audit_for_unknown_order_is_not_found() {
        let repo = MemOrderRepository::new(Arc::new(ChangeHub::new()));
        let result = repo
            .append_status_change(Uuid::new_v4(), Uuid::new_v4(), STATUS_FIELD, "a", "b")
            .await;
        assert!(matches!(result, Err(DomainError::NotFound(_))));
    }
}
