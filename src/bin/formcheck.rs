use formguard::cli;

fn main() {
    cli::run();
}
