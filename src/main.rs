fn main() -> anyhow::Result<()> {
    krosstalk_endpoint::logging::init();
    krosstalk_endpoint::run()
}
