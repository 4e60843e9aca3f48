/// Creates a boxed array filled with the given element without going through the stack.
pub fn boxed_array<T, const LEN: usize>(value: T) -> Box<[T; LEN]>
where
    T: Clone,
{
    let boxed_slice = vec![value; LEN].into_boxed_slice();
    Box::try_from(boxed_slice)
        .ok()
        .expect("boxed slice should have exactly LEN elements")
}

/// Hints to the compiler that a code path is infrequently taken, making it prefer to outline it.
#[cold]
#[inline(always)]
pub fn cold_path() {}
