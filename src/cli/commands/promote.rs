//! Promote command handler

use crate::config::Config;
use crate::db::Store;
use crate::domain::Role;

pub async fn cmd_promote(config: &Config, email: &str) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let email = email.trim().to_lowercase();

    if store.set_user_role(&email, Role::Admin).await? {
        println!("✓ {email} is now an admin");
    } else {
        println!("No account registered with {email}");
    }

    Ok(())
}
