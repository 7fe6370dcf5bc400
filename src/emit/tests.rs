use num_bigint::BigUint;

use super::*;
use crate::chain::{AdditionChain, Op};
use crate::program::{compile, Program};

fn cube() -> (AdditionChain, Program) {
    let chain = AdditionChain::new(BigUint::from(3u32), vec![Op::Double(0), Op::Add(1, 0)]);
    let program = compile(&chain).unwrap();
    (chain, program)
}

#[test]
fn test_rust_output() {
    let (chain, program) = cube();
    let unit = Unit {
        name: "cube",
        chain: &chain,
        program: &program,
    };
    let out = RustEmitter::new("Fp").emit(&[unit]).unwrap();
    insta::assert_snapshot!(out, @r###"
// Code generated by chainexp. DO NOT EDIT.

/// Returns `x^0x3`.
pub fn cube(x: Fp) -> Fp {
    // The sequence of 1 multiplications and 1 squarings is derived from the
    // following addition chain.
    //
    //    _10    = 2*1
    //    return _10 + 1
    //
    let mut z = x;
    z = x.square();
    z = z.mul(x);
    z
}
"###);
}

#[test]
fn test_rust_square_run_loop() {
    let chain = AdditionChain::new(BigUint::from(17u32), vec![Op::Shift(0, 4), Op::Add(1, 0)]);
    let program = compile(&chain).unwrap();
    let unit = Unit {
        name: "exp17",
        chain: &chain,
        program: &program,
    };
    let out = RustEmitter::new("Fp2").emit(&[unit]).unwrap();
    assert!(out.contains("pub fn exp17(x: Fp2) -> Fp2 {"));
    assert!(out.contains("    z = x.square();\n    for _ in 0..3 {\n        z = z.square();\n    }\n"));
    assert!(out.contains("4 squarings"));
}

#[test]
fn test_listing_output() {
    let (chain, program) = cube();
    let unit = Unit {
        name: "cube",
        chain: &chain,
        program: &program,
    };
    let out = ListingEmitter.emit(&[unit, unit]).unwrap();
    let lines: Vec<&str> = out.lines().collect();
    assert!(lines[0].starts_with("# cube: x^0x3 (1 mul, 1 sqr) #"));
    assert_eq!(lines[1], "z = x^2");
    assert_eq!(lines[2], "z = z * x");
    assert_eq!(lines[3], "");
    assert_eq!(lines.len(), 7);
}

#[test]
fn test_json_output_parses_back() {
    let (chain, program) = cube();
    let unit = Unit {
        name: "cube",
        chain: &chain,
        program: &program,
    };
    let out = JsonEmitter.emit(&[unit]).unwrap();
    let value: serde_json::Value = serde_json::from_str(&out).unwrap();
    let record = &value[0];
    assert_eq!(record["name"], "cube");
    assert_eq!(record["exponent"], "0x3");
    assert_eq!(record["counts"]["multiplications"], 1);
    assert_eq!(record["fingerprint"], program.fingerprint().to_hex());

    let back: Program = serde_json::from_value(record["program"].clone()).unwrap();
    assert_eq!(back, program);
    let back_chain: AdditionChain = serde_json::from_value(record["chain"].clone()).unwrap();
    assert_eq!(back_chain, chain);
}

#[test]
fn test_create_emitter() {
    for format in [Format::Listing, Format::Rust, Format::Json] {
        let emitter = create_emitter(format, "Fp");
        assert_eq!(emitter.format_name(), format.name());
        assert_eq!(Format::parse(format.name()), Some(format));
    }
    assert_eq!(create_emitter(Format::Rust, "Fp").extension(), "rs");
    assert_eq!(Format::parse("go"), None);
}
