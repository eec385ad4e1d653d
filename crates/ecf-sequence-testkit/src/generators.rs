//! Proptest generators for property-based testing.

use proptest::prelude::*;

use ecf_sequence_core::Channel;

use crate::fixtures::FixtureRow;

/// Generate a three-character type code such as `E32` or `B03`.
pub fn type_code() -> impl Strategy<Value = String> {
    "[A-Z][0-9]{2}".prop_map(String::from)
}

/// Generate a serial prefix starting with `code`.
pub fn serial_prefix_for(code: String) -> impl Strategy<Value = String> {
    "[0-9]{0,4}".prop_map(move |suffix| format!("{}{}", code, suffix))
}

/// Generate a serial prefix with its own type code.
pub fn serial_prefix() -> impl Strategy<Value = String> {
    type_code().prop_flat_map(serial_prefix_for)
}

/// Generate a counter that leaves room to increment within ten digits.
pub fn counter() -> impl Strategy<Value = u64> {
    0u64..9_000_000_000
}

/// Generate a channel.
pub fn channel() -> impl Strategy<Value = Channel> {
    prop_oneof![Just(Channel::A), Just(Channel::B)]
}

/// Generate channel text as a transport might send it, valid or not.
pub fn channel_text() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("A".to_string()),
        Just("b".to_string()),
        Just(String::new()),
        "[C-Zc-z0-9]{1,3}".prop_map(String::from),
    ]
}

/// Generate a live fixture row.
pub fn fixture_row() -> impl Strategy<Value = FixtureRow> {
    (serial_prefix(), counter(), counter(), "[A-Z ]{0,20}").prop_map(
        |(prefix, counter_a, counter_b, name)| {
            FixtureRow::new(&prefix)
                .counters(counter_a, counter_b)
                .named(name.trim())
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::TableFixture;
    use ecf_sequence_core::Sequence;
    use ecf_sequence_store::{SequenceStore, StoreError};

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn test_allocation_is_counter_plus_one(row in fixture_row(), channel in channel()) {
            let code = row.serial_prefix[..3].to_string();
            let expected = match channel {
                Channel::A => row.counter_a + 1,
                Channel::B => row.counter_b + 1,
            };
            let other = match channel {
                Channel::A => row.counter_b,
                Channel::B => row.counter_a,
            };

            let fixture = TableFixture::with_rows(&[row]);
            let sequence = fixture.store().allocate(&code, channel).unwrap();

            prop_assert_eq!(sequence.number, expected);
            prop_assert_eq!(&sequence.text()[..3], code.as_str());
            prop_assert_eq!(Sequence::parse(&sequence.text()).unwrap().number, expected);

            let untouched = match channel {
                Channel::A => Channel::B,
                Channel::B => Channel::A,
            };
            prop_assert_eq!(fixture.counter(&code, untouched), Some(other));
        }

        #[test]
        fn test_channel_text_validated(text in channel_text()) {
            let fixture = TableFixture::new();
            let result = fixture.store().allocate_str("E32", &text);
            match Channel::parse(&text) {
                Ok(_) => prop_assert!(result.is_ok()),
                Err(_) => {
                    let invalid = matches!(result, Err(StoreError::InvalidChannel(_)));
                    prop_assert!(invalid);
                }
            }
        }
    }
}
