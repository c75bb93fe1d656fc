#[tokio::main]
async fn main() -> anyhow::Result<()> {
    thai_lessons_backend::run().await
}
