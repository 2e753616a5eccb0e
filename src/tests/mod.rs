#[cfg(test)]
mod dex_roundtrip;
