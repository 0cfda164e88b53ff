fn main() -> anyhow::Result<()> {
    trailhead::run()?;
    Ok(())
}
