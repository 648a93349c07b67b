use tokio::task::JoinError;

/// Runs a blocking data source call on the runtime's blocking pool.
pub async fn run_blocking<F, T>(f: F) -> Result<T, JoinError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await
}
