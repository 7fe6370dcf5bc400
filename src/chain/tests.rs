use super::*;

fn big(v: u64) -> BigUint {
    BigUint::from(v)
}

#[test]
fn test_builder_reaches_three() {
    let mut b = ChainBuilder::new();
    let one = b.one();
    let two = b.double(one);
    let three = b.add(two, one);
    assert_eq!(three, 2);
    let chain = b.finish(big(3));
    assert_eq!(chain.len(), 2);
    assert_eq!(chain.last(), 2);
    let values = chain.validate().unwrap();
    assert_eq!(values, vec![big(1), big(2), big(3)]);
}

#[test]
fn test_shift_of_one_is_a_double() {
    let mut b = ChainBuilder::new();
    let one = b.one();
    let two = b.shift(one, 1);
    assert_eq!(b.shift(two, 0), two);
    let chain = b.finish(big(2));
    assert_eq!(chain.steps(), &[Op::Double(0)]);
}

#[test]
fn test_shift_values() {
    let chain = AdditionChain::new(big(24), vec![Op::Double(0), Op::Add(1, 0), Op::Shift(2, 3)]);
    let values = chain.validate().unwrap();
    assert_eq!(values[3], big(24));
}

#[test]
fn test_counts_expand_shifts() {
    let chain = AdditionChain::new(big(24), vec![Op::Double(0), Op::Add(1, 0), Op::Shift(2, 3)]);
    let counts = chain.counts();
    assert_eq!(counts.multiplications, 1);
    assert_eq!(counts.squarings, 4);
}

#[test]
fn test_empty_chain_is_one() {
    let chain = AdditionChain::new(big(1), Vec::new());
    assert!(chain.is_empty());
    assert_eq!(chain.validate().unwrap(), vec![big(1)]);
}

#[test]
fn test_forward_reference_rejected() {
    let chain = AdditionChain::new(big(3), vec![Op::Add(0, 2), Op::Double(0)]);
    assert_eq!(
        chain.validate(),
        Err(MalformedChain::DanglingRef { step: 1, target: 2 })
    );
}

#[test]
fn test_self_reference_rejected() {
    let chain = AdditionChain::new(big(2), vec![Op::Double(1)]);
    assert_eq!(
        chain.values(),
        Err(MalformedChain::DanglingRef { step: 1, target: 1 })
    );
}

#[test]
fn test_zero_shift_rejected() {
    let chain = AdditionChain::new(big(2), vec![Op::Double(0), Op::Shift(1, 0)]);
    assert_eq!(chain.validate(), Err(MalformedChain::ZeroShift { step: 2 }));
}

#[test]
fn test_target_mismatch_rejected() {
    let chain = AdditionChain::new(big(5), vec![Op::Double(0), Op::Add(1, 0)]);
    assert_eq!(
        chain.validate(),
        Err(MalformedChain::TargetMismatch {
            expected: big(5),
            found: big(3),
        })
    );
}

#[test]
fn test_zero_target_rejected() {
    let chain = AdditionChain::new(big(0), Vec::new());
    assert_eq!(chain.validate(), Err(MalformedChain::ZeroTarget));
}

#[test]
fn test_parse_exponent_forms() {
    assert_eq!(parse_exponent("0x1f"), Some(big(31)));
    assert_eq!(parse_exponent("0X1F"), Some(big(31)));
    assert_eq!(parse_exponent("1_000"), Some(big(1000)));
    assert_eq!(parse_exponent(" 42 "), Some(big(42)));
    assert_eq!(parse_exponent("0x"), None);
    assert_eq!(parse_exponent(""), None);
    assert_eq!(parse_exponent("0xzz"), None);
    assert_eq!(parse_exponent("-3"), None);
}
