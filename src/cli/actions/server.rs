use crate::cli::actions::Action;
use crate::gatehouse::new;
use anyhow::Result;
use url::Url;

/// Handle the server action
pub async fn handle(action: Action) -> Result<()> {
    match action {
        Action::Server { port, dsn, gate } => {
            // Fail early on a malformed DSN instead of deep inside the pool
            let dsn = Url::parse(&dsn)?;

            new(port, dsn.to_string(), gate).await?;
        }
    }

    Ok(())
}
