//! Vendor product inventory: form validation, CRUD and image upload.

use std::sync::Arc;

use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult, FieldError},
    models::{Product, Role, Session},
    notice::{Notice, Notices},
    platform::{ObjectStorage, ProductDraft, ProductRepository, RoleLookup},
};

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_DESCRIPTION_LEN: usize = 1000;
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, ToSchema)]
pub struct ProductForm {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: i64,
    pub stock: i32,
    pub category: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl ProductForm {
    pub fn from_product(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            description: product.description.clone().unwrap_or_default(),
            price: product.price,
            stock: product.stock,
            category: product.category.clone(),
            image_url: product.image_url.clone(),
        }
    }

    /// Reports every failing field, not just the first.
    pub fn validate(&self) -> Result<ProductDraft, Vec<FieldError>> {
        let mut errors = Vec::new();
        let name = self.name.trim();
        let description = self.description.trim();
        let category = self.category.trim();

        if name.is_empty() {
            errors.push(FieldError::new("name", "Product name is required"));
        } else if name.chars().count() > MAX_NAME_LEN {
            errors.push(FieldError::new(
                "name",
                format!("Name must be at most {MAX_NAME_LEN} characters"),
            ));
        }
        if description.chars().count() > MAX_DESCRIPTION_LEN {
            errors.push(FieldError::new(
                "description",
                format!("Description must be at most {MAX_DESCRIPTION_LEN} characters"),
            ));
        }
        if self.price <= 0 {
            errors.push(FieldError::new("price", "Price must be greater than zero"));
        }
        if self.stock < 0 {
            errors.push(FieldError::new("stock", "Stock cannot be negative"));
        }
        if category.is_empty() {
            errors.push(FieldError::new("category", "Category is required"));
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(ProductDraft {
            name: name.to_string(),
            description: (!description.is_empty()).then(|| description.to_string()),
            price: self.price,
            stock: self.stock,
            category: category.to_string(),
            image_url: self.image_url.clone().filter(|url| !url.trim().is_empty()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    fn extension(&self) -> Option<&'static str> {
        match self.content_type.as_str() {
            "image/jpeg" => Some("jpg"),
            "image/png" => Some("png"),
            "image/webp" => Some("webp"),
            _ => None,
        }
    }
}

/// A vendor's view of their own products.
pub struct InventoryManager {
    vendor_id: Uuid,
    products: Arc<dyn ProductRepository>,
    notices: Notices,
}

impl InventoryManager {
    /// Opens the inventory for `session`, which must belong to a vendor.
    pub async fn open(
        session: Option<&Session>,
        roles: &dyn RoleLookup,
        products: Arc<dyn ProductRepository>,
        notices: Notices,
    ) -> AppResult<Self> {
        match check_vendor(session, roles).await {
            Ok(vendor_id) => Ok(Self {
                vendor_id,
                products,
                notices,
            }),
            Err(err) => {
                notices.raise_error(&err);
                Err(err)
            }
        }
    }

    pub fn vendor_id(&self) -> Uuid {
        self.vendor_id
    }

    pub async fn list_products(&self) -> AppResult<Vec<Product>> {
        self.products
            .list_for_vendor(self.vendor_id)
            .await
            .map_err(|source| self.fail(AppError::LoadError(source)))
    }

    pub async fn create_product(&self, form: &ProductForm) -> AppResult<Product> {
        let draft = self.validated(form)?;
        let product = self
            .products
            .insert(self.vendor_id, &draft)
            .await
            .map_err(|source| self.fail(AppError::MutationError(source)))?;

        tracing::info!(vendor_id = %self.vendor_id, product_id = %product.id, "product created");
        self.notices
            .raise(Notice::success("Product added", format!("{} is now listed.", product.name)));
        Ok(product)
    }

    pub async fn update_product(&self, id: Uuid, form: &ProductForm) -> AppResult<Product> {
        let draft = self.validated(form)?;
        let product = self
            .products
            .update(self.vendor_id, id, &draft)
            .await
            .map_err(|source| self.fail(AppError::MutationError(source)))?;
        let product = match product {
            Some(p) => p,
            None => return Err(self.fail(AppError::NotFound)),
        };

        tracing::info!(vendor_id = %self.vendor_id, product_id = %product.id, "product updated");
        self.notices
            .raise(Notice::success("Product updated", format!("{} was saved.", product.name)));
        Ok(product)
    }

    pub async fn delete_product(&self, id: Uuid) -> AppResult<()> {
        let deleted = self
            .products
            .delete(self.vendor_id, id)
            .await
            .map_err(|source| self.fail(AppError::MutationError(source)))?;
        if !deleted {
            return Err(self.fail(AppError::NotFound));
        }

        tracing::info!(vendor_id = %self.vendor_id, product_id = %id, "product deleted");
        self.notices
            .raise(Notice::success("Product deleted", "The product was removed."));
        Ok(())
    }

    /// Uploads a product image under the vendor's folder and returns its
    /// public URL, ready to be put on a [`ProductForm`].
    pub async fn upload_image(
        &self,
        storage: &dyn ObjectStorage,
        upload: ImageUpload,
    ) -> AppResult<String> {
        let extension = match upload.extension() {
            Some(ext) => ext,
            None => {
                return Err(self.fail(AppError::Validation(vec![FieldError::new(
                    "image",
                    "Image must be a JPEG, PNG or WebP file",
                )])));
            }
        };
        if upload.bytes.is_empty() || upload.bytes.len() > MAX_IMAGE_BYTES {
            return Err(self.fail(AppError::Validation(vec![FieldError::new(
                "image",
                "Image must be between 1 byte and 5 MiB",
            )])));
        }

        let path = format!("{}/{}.{extension}", self.vendor_id, Uuid::new_v4());
        let url = storage
            .upload(&path, upload.bytes, &upload.content_type)
            .await
            .map_err(|source| self.fail(AppError::MutationError(source)))?;

        tracing::debug!(path = %path, file_name = %upload.file_name, "product image uploaded");
        Ok(url)
    }

    fn validated(&self, form: &ProductForm) -> AppResult<ProductDraft> {
        form.validate()
            .map_err(|fields| self.fail(AppError::Validation(fields)))
    }

    fn fail(&self, err: AppError) -> AppError {
        self.notices.raise_error(&err);
        err
    }
}

async fn check_vendor(session: Option<&Session>, roles: &dyn RoleLookup) -> AppResult<Uuid> {
    let session = session.ok_or(AppError::AuthRequired)?;
    let role = roles
        .role_of(session.user_id)
        .await
        .map_err(AppError::LoadError)?;

    match role {
        Some(Role::Vendor) => Ok(session.user_id),
        Some(Role::Customer) | Some(Role::Rider) | None => {
            tracing::info!(user_id = %session.user_id, role = ?role, "inventory denied");
            Err(AppError::AccessDenied)
        }
    }
}
