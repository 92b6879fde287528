use crate::layout::StructLayout;
use crate::types::AbiType;
use crate::word;
use num_bigint::BigUint;

fn btc_output() -> StructLayout {
    StructLayout::new(
        "btc_output",
        vec![
            ("value".into(), AbiType::parse("uint64").unwrap(), None),
            (
                "prefix".into(),
                AbiType::parse("uint24").unwrap(),
                Some(word::parse_number("0x160014").unwrap()),
            ),
            ("hash".into(), AbiType::parse("bytes20").unwrap(), None),
        ],
    )
    .unwrap()
}

#[test]
fn initialiser_with_defaults_matches_hand_packing() {
    let s = btc_output();
    let value = word::parse_number("100000000").unwrap();
    let hash = word::parse_number("0xdeadbeef00000000000000000000000000000000").unwrap();

    let mut packed = BigUint::default();
    packed |= s.member("value").unwrap().place(&value);
    packed |= s.member("prefix").unwrap().place(&s.member("prefix").unwrap().default.clone());
    packed |= s.member("hash").unwrap().place(&hash);

    let expected = {
        let a = word::shl(&word::from_u64(192), &value);
        let b = word::shl(&word::from_u64(168), &word::parse_number("0x160014").unwrap());
        let c = word::shl(&word::from_u64(8), &hash);
        word::or(&word::or(&a, &b), &c)
    };
    assert_eq!(packed, expected);
}

#[test]
fn all_defaults_equal_the_packed_default_constant() {
    let s = btc_output();
    let mut packed = BigUint::default();
    for m in s.value_members() {
        packed |= m.place(&m.default.clone());
    }
    assert_eq!(packed, s.default);
}

#[test]
fn padding_members_occupy_space_but_are_unaddressable() {
    let s = StructLayout::new(
        "padded",
        vec![
            ("a".into(), AbiType::parse("uint8").unwrap(), None),
            ("+".into(), AbiType::parse("uint8").unwrap(), None),
            ("b".into(), AbiType::parse("uint16").unwrap(), None),
        ],
    )
    .unwrap();
    assert_eq!(s.width_bits, 32);
    assert!(s.member("+").is_none());
    assert_eq!(s.member("b").unwrap().offset, 16);
    assert_eq!(s.value_members().count(), 2);
}

#[test]
fn read_back_through_shift_and_mask() {
    let s = btc_output();
    let value = word::parse_number("100000000").unwrap();
    let word_value = s.member("value").unwrap().place(&value) | &s.default;
    let m = s.member("value").unwrap();
    let read = word::and(
        &word::shr(&word::from_u64(m.shift() as u64), &word_value),
        &m.mask(),
    );
    assert_eq!(read, value);
}
