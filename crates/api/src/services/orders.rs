use chrono::Utc;
use persistence::store::Store;
use uuid::Uuid;

use domain::error::DomainError;
use domain::models::{CreateOrderInput, Order, StatusChange, UpdateOrderInput, STATUS_FIELD};
use domain::services::dashboard::{compute_dashboard_stats, DashboardStats};
use domain::services::schedule::{day_of, month_window};

use crate::middleware::metrics::{record_order_created, record_status_change};

/// Order lifecycle: creation, edits, status transitions with audit
/// trail, and the calendar and dashboard read paths.
pub struct OrderService {
    store: Store,
}

impl OrderService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn create(
        &self,
        input: CreateOrderInput,
        actor_id: Uuid,
    ) -> Result<Order, DomainError> {
        if input.service.trim().is_empty() {
            return Err(DomainError::validation("Service description is required"));
        }
        if self.store.clients.find(input.client_id).await?.is_none() {
            return Err(DomainError::validation("Client does not exist"));
        }
        let status = self
            .store
            .statuses
            .find(input.status_id)
            .await?
            .ok_or_else(|| DomainError::validation("Status does not exist"))?;
        if !status.is_active {
            return Err(DomainError::validation(
                "Cannot create an order in a retired status",
            ));
        }

        let order = self.store.orders.insert(&input, actor_id).await?;
        record_order_created();
        tracing::info!(order_id = %order.id, client_id = %order.client_id, "Order created");
        Ok(order)
    }

    pub async fn update(
        &self,
        order_id: Uuid,
        input: UpdateOrderInput,
    ) -> Result<Order, DomainError> {
        if let Some(service) = &input.service {
            if service.trim().is_empty() {
                return Err(DomainError::validation("Service description is required"));
            }
        }
        if let Some(client_id) = input.client_id {
            if self.store.clients.find(client_id).await?.is_none() {
                return Err(DomainError::validation("Client does not exist"));
            }
        }
        self.store.orders.update(order_id, &input).await
    }

    /// Moves an order to a new status and records the change under the
    /// actor's id. A transition to the current status is a no-op and
    /// leaves no audit entry.
    pub async fn change_status(
        &self,
        order_id: Uuid,
        new_status_id: Uuid,
        actor_id: Uuid,
    ) -> Result<(), DomainError> {
        let order = self
            .store
            .orders
            .find(order_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Order {order_id} not found")))?;

        if order.status_id == new_status_id {
            return Ok(());
        }

        let new_status = self
            .store
            .statuses
            .find(new_status_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Status {new_status_id} not found")))?;

        let old_name = match self.store.statuses.find(order.status_id).await? {
            Some(status) => status.name,
            None => order.status_id.to_string(),
        };

        self.store.orders.set_status(order_id, new_status_id).await?;
        record_status_change();

        // The transition itself already happened. A lost audit row is
        // logged rather than unwinding the move.
        if let Err(e) = self
            .store
            .orders
            .append_status_change(order_id, actor_id, STATUS_FIELD, &old_name, &new_status.name)
            .await
        {
            tracing::warn!(order_id = %order_id, error = %e, "Status changed but audit entry failed");
        }

        tracing::info!(
            order_id = %order_id,
            from = %old_name,
            to = %new_status.name,
            "Order status changed"
        );
        Ok(())
    }

    pub async fn get(&self, order_id: Uuid) -> Result<Order, DomainError> {
        self.store
            .orders
            .find(order_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Order {order_id} not found")))
    }

    pub async fn list(&self) -> Result<Vec<Order>, DomainError> {
        self.store.orders.list().await
    }

    /// Orders whose delivery date falls inside the given month.
    pub async fn list_for_month(
        &self,
        year: i32,
        month: u32,
    ) -> Result<Vec<Order>, DomainError> {
        let (start, end) = month_window(year, month)
            .ok_or_else(|| DomainError::validation("Invalid month"))?;
        self.store.orders.list_in_window(start, end).await
    }

    pub async fn history(&self, order_id: Uuid) -> Result<Vec<StatusChange>, DomainError> {
        self.get(order_id).await?;
        self.store.orders.history(order_id).await
    }

    pub async fn dashboard(&self) -> Result<DashboardStats, DomainError> {
        let orders = self.store.orders.list().await?;
        let statuses = self.store.statuses.list(false).await?;
        Ok(compute_dashboard_stats(&orders, &statuses, day_of(Utc::now())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use domain::models::{CreateClientInput, CreateStatusInput};

    async fn seeded_store() -> (Store, Uuid, Uuid, Uuid) {
        let store = Store::in_memory();
        let client = store
            .clients
            .insert(
                &CreateClientInput {
                    name: "Padaria Central".to_string(),
                    email: None,
                    phone: None,
                    address: None,
                    notes: None,
                },
                Uuid::new_v4(),
            )
            .await
            .unwrap();
        let initial = store.statuses.find_initial().await.unwrap().unwrap();
        (store, client.id, initial.id, Uuid::new_v4())
    }

    fn order_input(client_id: Uuid, status_id: Uuid) -> CreateOrderInput {
        CreateOrderInput {
            client_id,
            service: "500 flyers A5".to_string(),
            description: None,
            status_id,
            delivery_date: Utc::now() + Duration::days(3),
        }
    }

    #[tokio::test]
    async fn create_rejects_blank_service() {
        let (store, client_id, status_id, actor) = seeded_store().await;
        let service = OrderService::new(store);
        let mut input = order_input(client_id, status_id);
        input.service = "   ".to_string();
        let err = service.create(input, actor).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn create_rejects_unknown_client() {
        let (store, _, status_id, actor) = seeded_store().await;
        let service = OrderService::new(store);
        let err = service
            .create(order_input(Uuid::new_v4(), status_id), actor)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn create_rejects_retired_status() {
        let (store, client_id, _, actor) = seeded_store().await;
        let retired = store
            .statuses
            .insert(&CreateStatusInput {
                name: "Arquivado".to_string(),
                color: "#777777".to_string(),
            })
            .await
            .unwrap();
        store.statuses.deactivate(retired.id).await.unwrap();

        let service = OrderService::new(store);
        let err = service
            .create(order_input(client_id, retired.id), actor)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn status_change_appends_audit_entry() {
        let (store, client_id, status_id, actor) = seeded_store().await;
        let next = store
            .statuses
            .insert(&CreateStatusInput {
                name: "Em producao".to_string(),
                color: "#3366ff".to_string(),
            })
            .await
            .unwrap();

        let service = OrderService::new(store.clone());
        let order = service
            .create(order_input(client_id, status_id), actor)
            .await
            .unwrap();

        service.change_status(order.id, next.id, actor).await.unwrap();

        let history = service.history(order.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].field_name, STATUS_FIELD);
        assert_eq!(history[0].new_value, "Em producao");
        assert_eq!(history[0].changed_by, actor);

        let reloaded = service.get(order.id).await.unwrap();
        assert_eq!(reloaded.status_id, next.id);
    }

    #[tokio::test]
    async fn same_status_transition_is_silent() {
        let (store, client_id, status_id, actor) = seeded_store().await;
        let service = OrderService::new(store);
        let order = service
            .create(order_input(client_id, status_id), actor)
            .await
            .unwrap();

        service
            .change_status(order.id, status_id, actor)
            .await
            .unwrap();
        assert!(service.history(order.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn month_filter_uses_half_open_window() {
        let (store, client_id, status_id, actor) = seeded_store().await;
        let service = OrderService::new(store);

        let mut march = order_input(client_id, status_id);
        march.delivery_date = "2025-03-31T23:59:00Z".parse().unwrap();
        let mut april = order_input(client_id, status_id);
        april.delivery_date = "2025-04-01T00:00:00Z".parse().unwrap();

        let march_order = service.create(march, actor).await.unwrap();
        service.create(april, actor).await.unwrap();

        let found = service.list_for_month(2025, 3).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, march_order.id);
    }

    #[tokio::test]
    async fn history_of_missing_order_is_not_found() {
        let (store, _, _, _) = seeded_store().await;
        let service = OrderService::new(store);
        let err = service.history(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }
}
