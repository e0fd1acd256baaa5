use crate::error::OffloadError;
use crate::sysfs::{emit_u32, parse_u32};

#[test]
fn accepts_plain_and_newline_terminated() {
    assert_eq!(parse_u32("500").unwrap(), 500);
    assert_eq!(parse_u32("500\n").unwrap(), 500);
    assert_eq!(parse_u32("+7\n").unwrap(), 7);
    assert_eq!(parse_u32("4294967295").unwrap(), u32::MAX);
}

#[test]
fn rejects_everything_else() {
    for input in ["", "\n", " 5", "5 ", "5\n\n", "-1", "0x10", "abc", "4294967296", "+"] {
        assert!(
            matches!(parse_u32(input), Err(OffloadError::InvalidArgument(_))),
            "{input:?} should be rejected"
        );
    }
}

#[test]
fn emits_newline_terminated() {
    assert_eq!(emit_u32(0), "0\n");
    assert_eq!(emit_u32(1000), "1000\n");
}
