use anyhow::Result;

use action_logger_core::{AppConfig, LogQuery};

pub async fn run(config: &AppConfig, limit: i64) -> Result<()> {
    let output = LogQuery::from_config(config).query(limit).await;
    println!("{}", output);
    Ok(())
}
