use std::fs;

use num_bigint::BigUint;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use chainexp::chain::oracle::ChainOracle;
use chainexp::chain::script::{parse_script, print_script};
use chainexp::config::Manifest;
use chainexp::curve::{modulus, sm9, Routine};
use chainexp::{
    build_manifest, compile, compile_exponent, write_artifacts, ChainBuilder, CompileOptions,
    FieldElement, Fp, Fp2, SmallField, WindowOracle,
};

fn random_fp(rng: &mut StdRng) -> Fp {
    let mut bytes = [0u8; 64];
    rng.fill_bytes(&mut bytes);
    Fp::from_bytes_wide(&bytes)
}

#[test]
fn test_builder_chain_to_execution() {
    let mut b = ChainBuilder::new();
    let two = b.double(b.one());
    b.add(two, b.one());
    let chain = b.finish(BigUint::from(3u32));

    let program = compile(&chain).unwrap();
    assert_eq!(program.to_string(), "z = x^2\nz = z * x\n");

    let x = Fp::from_u64(12345);
    assert_eq!(chainexp::execute(&program, &x), x.mul(x).mul(x));
}

#[test]
fn test_searched_chain_survives_script_round_trip() {
    let e = BigUint::parse_bytes(b"fffffffe", 16).unwrap();
    let chain = WindowOracle::new(4).search(&e).unwrap();
    let reparsed = parse_script(&print_script(&chain)).unwrap();
    assert_eq!(reparsed.target(), &e);

    let a = compile(&chain).unwrap();
    let b = compile(&reparsed).unwrap();
    let x = SmallField::<1_000_003>::new(77);
    assert_eq!(chainexp::execute(&a, &x), x.pow_vartime(&e));
    assert_eq!(chainexp::execute(&b, &x), x.pow_vartime(&e));
}

#[test]
fn test_manifest_build_writes_files() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("cube.chain"), "_10 = 2*1\nreturn _10 + 1\n").unwrap();
    let toml = dir.path().join("chainexp.toml");
    fs::write(
        &toml,
        "# field routines\n\
         [defaults]\nwindow = 3\n\n\
         [program.cube]\nscript = \"cube.chain\"\nformat = \"rust\"\noutput = \"out/cube.rs\"\n\n\
         [program.inv97]\nexponent = 95\nformat = \"json\"\n",
    )
    .unwrap();

    let manifest = Manifest::load(&toml).unwrap();
    let artifacts = build_manifest(&manifest).unwrap();
    write_artifacts(&artifacts).unwrap();

    let rust = fs::read_to_string(dir.path().join("out/cube.rs")).unwrap();
    assert!(rust.starts_with("// Code generated by chainexp. DO NOT EDIT.\n"));
    assert!(rust.contains("pub fn cube(x: Fp) -> Fp {"));

    let json = fs::read_to_string(dir.path().join("inv97.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value[0]["name"], "inv97");
}

#[test]
fn test_compiled_exponent_matches_reference() {
    let mut rng = StdRng::seed_from_u64(3);
    let e = modulus() - BigUint::from(3u32);
    let compiled = compile_exponent(&e, 5, &CompileOptions::default()).unwrap();
    for _ in 0..8 {
        let x = random_fp(&mut rng);
        assert_eq!(chainexp::execute(&compiled.program, &x), x.pow_vartime(&e));
    }
}

#[test]
fn test_sm9_field_routines() {
    let mut rng = StdRng::seed_from_u64(17);
    for _ in 0..16 {
        let x = random_fp(&mut rng);
        if !bool::from(x.is_zero()) {
            assert_eq!(x.mul(x.invert()), Fp::ONE);
        }
        let root = x.square().sqrt().unwrap();
        assert!(root == x || root == x.neg());

        let y = Fp2::new(random_fp(&mut rng), random_fp(&mut rng));
        let root2 = y.square().sqrt().unwrap();
        assert_eq!(root2.square(), y.square());
        assert_eq!(y.frobenius(), y.conjugate());
    }
    assert!(bool::from(Fp::from_u64(2).sqrt().is_none()));
    assert_eq!(sm9().program(Routine::Frobenius).exponent(), &modulus());
}
