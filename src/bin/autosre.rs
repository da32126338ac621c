#[tokio::main]
async fn main() -> anyhow::Result<()> {
    autosre_ui_terminal::run().await
}
