fn main() {
    medguard_lib::run()
}
