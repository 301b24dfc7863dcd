fn main() -> anyhow::Result<()> {
    pebble_lang::runner::main()
}
