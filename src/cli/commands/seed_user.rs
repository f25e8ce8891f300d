//! Seed user command handler

use anyhow::Context;

use crate::config::Config;
use crate::state::SharedState;

/// Values given on the command line; gaps are filled from configuration.
#[derive(Debug, Default)]
pub struct SeedUserArgs {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) struct ResolvedSeedUser {
    pub username: String,
    pub email: String,
    pub password: String,
}

pub(crate) fn resolve(config: &Config, args: SeedUserArgs) -> anyhow::Result<ResolvedSeedUser> {
    let bootstrap = config.bootstrap.as_ref();

    let username = args
        .username
        .or_else(|| bootstrap.map(|b| b.username.clone()))
        .unwrap_or_else(|| config.auth.bootstrap_username.clone());

    let email = args
        .email
        .or_else(|| bootstrap.map(|b| b.email.clone()))
        .filter(|e| !e.trim().is_empty())
        .unwrap_or_else(|| format!("{username}@example.com"));

    let password = args
        .password
        .or_else(|| bootstrap.map(|b| b.password.clone()))
        .filter(|p| !p.is_empty())
        .context("No password given: pass --password or set [bootstrap].password")?;

    Ok(ResolvedSeedUser {
        username,
        email,
        password,
    })
}

pub async fn cmd_seed_user(config: &Config, args: SeedUserArgs) -> anyhow::Result<()> {
    let seed = resolve(config, args)?;
    let state = SharedState::new(config.clone()).await?;

    let created = state
        .auth_service
        .ensure_user(&seed.username, &seed.email, &seed.password)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to seed user: {e}"))?;

    if created {
        println!("✓ Created user '{}'", seed.username);
    } else {
        println!("User '{}' already exists, nothing to do", seed.username);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BootstrapUserConfig;

    #[test]
    fn arguments_take_precedence_over_config() {
        let mut config = Config::default();
        config.bootstrap = Some(BootstrapUserConfig {
            username: "seed".to_string(),
            email: "seed@example.com".to_string(),
            password: "from-config".to_string(),
        });

        let resolved = resolve(
            &config,
            SeedUserArgs {
                password: Some("from-cli".to_string()),
                ..SeedUserArgs::default()
            },
        )
        .unwrap();

        assert_eq!(resolved.username, "seed");
        assert_eq!(resolved.email, "seed@example.com");
        assert_eq!(resolved.password, "from-cli");
    }

    #[test]
    fn falls_back_to_bootstrap_username() {
        let resolved = resolve(
            &Config::default(),
            SeedUserArgs {
                password: Some("pw".to_string()),
                ..SeedUserArgs::default()
            },
        )
        .unwrap();

        assert_eq!(resolved.username, "testuser");
        assert_eq!(resolved.email, "testuser@example.com");
    }

    #[test]
    fn password_is_required() {
        assert!(resolve(&Config::default(), SeedUserArgs::default()).is_err());
    }
}
