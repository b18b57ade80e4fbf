//! Thin entrypoint for the `jwt-policy` binary.

fn main() {
    std::process::exit(jwt_policy_cli::run());
}
