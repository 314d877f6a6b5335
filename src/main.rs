use blockfs::shell::start_shell;

fn main() {
    start_shell();
}
