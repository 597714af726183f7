/// format a value as lowercase hex, zero-padded to `width` digits
///
/// NB. width is a minimum; wider values are never truncated
pub fn render_hex(value: u32, width: usize, with_prefix: bool) -> String {
    let prefix = if with_prefix { "0x" } else { "" };
    format!("{}{:0width$x}", prefix, value, width = width)
}

/// label, hex and decimal renderings in one fragment, e.g. `DELAY: 0x3c / 60`
pub fn render_labeled_value(name: &str, value: u32, width: usize) -> String {
    format!("{}: {} / {}", name, render_hex(value, width, true), value)
}

/// anything that may or may not be an ordered sequence of `T`
///
/// scalars answer `None`, so comparing a scalar against a sequence is simply
/// unequal rather than an error
pub trait AsSequence<T> {
    fn as_sequence(&self) -> Option<&[T]>;
}

impl<T> AsSequence<T> for [T] {
    fn as_sequence(&self) -> Option<&[T]> {
        Some(self)
    }
}

impl<T, const N: usize> AsSequence<T> for [T; N] {
    fn as_sequence(&self) -> Option<&[T]> {
        Some(self.as_slice())
    }
}

impl<T> AsSequence<T> for Vec<T> {
    fn as_sequence(&self) -> Option<&[T]> {
        Some(self.as_slice())
    }
}

impl<T, S: AsSequence<T> + ?Sized> AsSequence<T> for &S {
    fn as_sequence(&self) -> Option<&[T]> {
        (**self).as_sequence()
    }
}

macro_rules! scalar_is_not_a_sequence {
    ($($t:ty),*) => {
        $(
            impl<T> AsSequence<T> for $t {
                fn as_sequence(&self) -> Option<&[T]> {
                    None
                }
            }
        )*
    };
}

scalar_is_not_a_sequence!(u8, u16, u32, u64, usize, i32, bool);

/// element-wise equality of two sequences; false if either side isn't one
pub fn sequence_equals<T, A, B>(left: &A, right: &B) -> bool
where
    T: PartialEq,
    A: AsSequence<T> + ?Sized,
    B: AsSequence<T> + ?Sized,
{
    match (left.as_sequence(), right.as_sequence()) {
        (Some(l), Some(r)) => l.len() == r.len() && l.iter().zip(r).all(|(a, b)| a == b),
        _ => false,
    }
}
