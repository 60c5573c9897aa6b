//! Turning a [`SizeInfo`] into the final buffer layout.
use {
    crate::{config::Config, len::WidthClass, signature::TypeDescription, size::SizeInfo},
    log::debug,
};

const TYPE_LITERAL_BIT: u8 = 0b100;
const LEN_WIDTH_SHIFT: u8 = 3;
const COMPATIBLE_WIDTH_MASK: u8 = 0b11;

/// Exact byte length of an encoding and its metainfo byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BufferPlan {
    pub length: u64,
    pub metainfo: u8,
}

impl BufferPlan {
    /// Width of every dynamic container length prefix.
    #[inline]
    pub const fn len_width(&self) -> WidthClass {
        WidthClass::from_bits(self.metainfo >> LEN_WIDTH_SHIFT)
    }

    /// Width of the compatible total-length field, if one is present.
    #[inline]
    pub const fn compatible_width(&self) -> Option<WidthClass> {
        match self.metainfo & COMPATIBLE_WIDTH_MASK {
            0 => None,
            bits => Some(WidthClass::from_bits(bits)),
        }
    }

    #[inline]
    pub const fn has_type_literal(&self) -> bool {
        self.metainfo & TYPE_LITERAL_BIT != 0
    }

    /// Whether a metainfo byte follows the signature.
    #[inline]
    pub const fn has_metainfo(&self) -> bool {
        self.metainfo != 0
    }
}

/// Decide the header and the length width of one encoding.
pub fn resolve(size: SizeInfo, description: &TypeDescription, config: Config) -> BufferPlan {
    if !config.metainfo_enabled() {
        return resolve_headless(size);
    }

    let width = WidthClass::for_len(size.max_dynamic_len);
    let mut metainfo = width.bits() << LEN_WIDTH_SHIFT;
    // Signature header.
    let mut length = size_of::<u32>() as u64;
    length += size.total + size.dynamic_count * width.bytes() as u64;

    let literal = config.type_literal_enabled();
    let compatible = description.has_compatible();
    if width != WidthClass::One || literal || compatible {
        length += 1;
    }
    if literal {
        length += description.literal().len() as u64 + 1;
        metainfo |= TYPE_LITERAL_BIT;
    }
    if compatible {
        let total_width = WidthClass::for_total(length);
        length += total_width.bytes() as u64;
        metainfo |= total_width.bits();
    }

    if metainfo != 0 {
        debug!(
            "resolved buffer plan: length={length} metainfo={metainfo:#07b} containers={} \
             max_len={}",
            size.dynamic_count, size.max_dynamic_len
        );
    }
    BufferPlan { length, metainfo }
}

/// Without a metainfo byte nothing can record a narrower width, so lengths take eight bytes.
fn resolve_headless(size: SizeInfo) -> BufferPlan {
    let width = WidthClass::Eight;
    BufferPlan {
        length: size.total + size.dynamic_count * width.bytes() as u64,
        metainfo: width.bits() << LEN_WIDTH_SHIFT,
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{proptest_config::proptest_cfg, schema::Compatible, size::calculate_one},
        proptest::prelude::*,
    };

    fn plan<T: crate::Pack>(value: &T, config: Config) -> BufferPlan {
        let size = crate::size::SizeCalculator::calculate(value, config);
        resolve(size, &TypeDescription::of::<T>(config), config)
    }

    #[test]
    fn narrow_containers_need_no_metainfo() {
        let plan = plan(&(10i32, String::from("tom")), Config::DEFAULT);
        assert_eq!(plan.length, 4 + 4 + 1 + 3);
        assert_eq!(plan.metainfo, 0);
        assert!(!plan.has_metainfo());
    }

    #[test]
    fn wide_container_selects_two_byte_class() {
        let plan = plan(&vec![0u8; 300], Config::DEFAULT);
        assert_eq!(plan.len_width(), WidthClass::Two);
        assert_eq!((plan.metainfo >> 3) & 0b11, 0b01);
        assert_eq!(plan.length, 4 + 1 + 2 + 300);
    }

    #[test]
    fn type_literal_reserves_literal_and_nul() {
        let description = TypeDescription::of::<u64>(Config::ENABLE_TYPE_INFO);
        let plan = resolve(
            calculate_one(&5u64),
            &description,
            Config::ENABLE_TYPE_INFO,
        );
        assert!(plan.has_type_literal());
        assert_eq!(plan.length, 4 + 1 + 2 + 8);
    }

    #[test]
    fn compatible_reserves_total_length() {
        let value = (1i32, Compatible::<u8, 1>::new(3));
        let plan = plan(&value, Config::DEFAULT);
        assert_eq!(plan.compatible_width(), Some(WidthClass::Two));
        // signature, metainfo, total length, i32, flag, payload
        assert_eq!(plan.length, 4 + 1 + 2 + 4 + 1 + 1);
    }

    #[test]
    fn headless_pins_eight_byte_lengths() {
        let plan = plan(&String::from("ab"), Config::DISABLE_ALL_META_INFO);
        assert_eq!(plan.len_width(), WidthClass::Eight);
        assert_eq!(plan.length, 8 + 2);
    }

    proptest! {
        #![proptest_config(proptest_cfg())]

        #[test]
        fn width_class_matches_largest_container(lens in proptest::collection::vec(0usize..70_000, 1..4)) {
            let value: Vec<Vec<u8>> = lens.iter().map(|len| vec![0; *len]).collect();
            let max = lens.iter().copied().max().unwrap().max(lens.len());
            let plan = plan(&value, Config::DEFAULT);
            prop_assert_eq!(plan.len_width(), WidthClass::for_len(max as u64));
        }
    }
}
