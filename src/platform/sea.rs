use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::{
    entity::{
        orders::{Column as OrderCol, Entity as Orders, Model as OrderModel},
        products::{
            ActiveModel as ProductActive, Column as ProdCol, Entity as Products,
            Model as ProductModel,
        },
        profiles::Entity as Profiles,
    },
    models::{Order, Product, Role},
};

use super::{
    OrderSource, PlatformError, PlatformResult, ProductDraft, ProductRepository, RoleLookup,
};

/// Reads the platform's tables directly through SeaORM.
#[derive(Debug, Clone)]
pub struct SeaOrmPlatform {
    orm: DatabaseConnection,
}

impl SeaOrmPlatform {
    pub fn new(orm: DatabaseConnection) -> Self {
        Self { orm }
    }
}

#[async_trait]
impl RoleLookup for SeaOrmPlatform {
    async fn role_of(&self, user_id: Uuid) -> PlatformResult<Option<Role>> {
        let profile = Profiles::find_by_id(user_id).one(&self.orm).await?;
        Ok(profile.and_then(|p| match p.role.parse::<Role>() {
            Ok(role) => Some(role),
            Err(err) => {
                tracing::warn!(user_id = %user_id, error = %err, "profile has no usable role");
                None
            }
        }))
    }
}

#[async_trait]
impl OrderSource for SeaOrmPlatform {
    async fn orders_for_customer(&self, customer_id: Uuid) -> PlatformResult<Vec<Order>> {
        Orders::find()
            .filter(OrderCol::CustomerId.eq(customer_id))
            .order_by_desc(OrderCol::CreatedAt)
            .all(&self.orm)
            .await?
            .into_iter()
            .map(order_from_entity)
            .collect()
    }
}

#[async_trait]
impl ProductRepository for SeaOrmPlatform {
    async fn list_for_vendor(&self, vendor_id: Uuid) -> PlatformResult<Vec<Product>> {
        let items = Products::find()
            .filter(ProdCol::VendorId.eq(vendor_id))
            .order_by_desc(ProdCol::CreatedAt)
            .all(&self.orm)
            .await?
            .into_iter()
            .map(product_from_entity)
            .collect();
        Ok(items)
    }

    async fn insert(&self, vendor_id: Uuid, draft: &ProductDraft) -> PlatformResult<Product> {
        let product = ProductActive {
            id: Set(Uuid::new_v4()),
            vendor_id: Set(vendor_id),
            name: Set(draft.name.clone()),
            description: Set(draft.description.clone()),
            price: Set(draft.price),
            stock: Set(draft.stock),
            category: Set(draft.category.clone()),
            image_url: Set(draft.image_url.clone()),
            created_at: NotSet,
        }
        .insert(&self.orm)
        .await?;

        Ok(product_from_entity(product))
    }

    async fn update(
        &self,
        vendor_id: Uuid,
        id: Uuid,
        draft: &ProductDraft,
    ) -> PlatformResult<Option<Product>> {
        let existing = Products::find()
            .filter(
                Condition::all()
                    .add(ProdCol::Id.eq(id))
                    .add(ProdCol::VendorId.eq(vendor_id)),
            )
            .one(&self.orm)
            .await?;
        let existing = match existing {
            Some(p) => p,
            None => return Ok(None),
        };

        let mut active: ProductActive = existing.into();
        active.name = Set(draft.name.clone());
        active.description = Set(draft.description.clone());
        active.price = Set(draft.price);
        active.stock = Set(draft.stock);
        active.category = Set(draft.category.clone());
        active.image_url = Set(draft.image_url.clone());
        let product = active.update(&self.orm).await?;

        Ok(Some(product_from_entity(product)))
    }

    async fn delete(&self, vendor_id: Uuid, id: Uuid) -> PlatformResult<bool> {
        let result = Products::delete_many()
            .filter(
                Condition::all()
                    .add(ProdCol::Id.eq(id))
                    .add(ProdCol::VendorId.eq(vendor_id)),
            )
            .exec(&self.orm)
            .await?;
        Ok(result.rows_affected > 0)
    }
}

fn order_from_entity(model: OrderModel) -> PlatformResult<Order> {
    let status = model
        .status
        .parse()
        .map_err(|err| PlatformError::InvalidData(format!("order {}: {err}", model.id)))?;

    Ok(Order {
        id: model.id,
        customer_id: model.customer_id,
        product_name: model.product_name,
        price: model.price,
        quantity: model.quantity,
        total_amount: model.total_amount,
        delivery_address: model.delivery_address,
        phone: model.phone,
        status,
        created_at: model.created_at.with_timezone(&Utc),
        rider_id: model.rider_id,
    })
}

fn product_from_entity(model: ProductModel) -> Product {
    Product {
        id: model.id,
        vendor_id: model.vendor_id,
        name: model.name,
        description: model.description,
        price: model.price,
        stock: model.stock,
        category: model.category,
        image_url: model.image_url,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
