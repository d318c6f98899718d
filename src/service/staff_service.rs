// service/staff_service.rs
use crate::{
    db::Store,
    models::usermodel::{User, UserRole},
    service::error::ServiceError,
};

/// Makes every configured id a staff admin, creating missing users with an
/// `admin_<id>` handle. Returns how many users were touched.
pub async fn bootstrap_staff(store: &dyn Store, admin_ids: &[i64]) -> Result<usize, ServiceError> {
    for &telegram_id in admin_ids {
        let user = match store.get_user(telegram_id).await? {
            Some(mut existing) => {
                existing.is_staff = true;
                existing.role = UserRole::Admin;
                existing
            }
            None => User::new(
                telegram_id,
                Some(format!("admin_{}", telegram_id)),
                UserRole::Admin,
                true,
            ),
        };
        store.save_user(&user).await?;
        tracing::info!("Staff account ready for {} ({})", telegram_id, user.role.to_str());
    }
    Ok(admin_ids.len())
}
