fn main() {
    #[cfg(feature = "fuzz")]
    {
        afl::fuzz!(|data: &[u8]| {
            if let Ok(input) = std::str::from_utf8(data) {
                if fuzz(input).is_err() {
                    println!("Fuzzing failed");
                } else {
                    println!("Fuzzing succeeded");
                }
            }
        });
    }
}

#[cfg(feature = "fuzz")]
fn fuzz(input: &str) -> miette::Result<()> {
    let tac = tacc::compile(input)?;
    drop(tac);
    Ok(())
}
