fn main() -> anyhow::Result<()> {
    record_filter::run().map_err(|e| anyhow::anyhow!("{e}"))
}
