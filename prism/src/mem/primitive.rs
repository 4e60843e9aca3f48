/// Trait for memory primitives.
///
/// A primitive is either a byte, half-word or word, signed or unsigned. All bus traffic is
/// expressed in terms of these.
pub trait Primitive: Copy + std::fmt::Debug + std::fmt::UpperHex + Send + Sync + 'static {
    /// The alignment the bus requires for this primitive.
    const ALIGNMENT: u32;

    /// Reads a little-endian value from the start of `buf`. Missing trailing bytes read as zero.
    fn read_from(buf: &[u8]) -> Self;

    /// Writes this value, little-endian, to the start of `buf`. Bytes that do not fit are
    /// silently dropped.
    fn write_to(self, buf: &mut [u8]);
}

macro_rules! impl_primitive {
    ($($type:ty),*) => {
        $(
            impl Primitive for $type {
                const ALIGNMENT: u32 = align_of::<Self>() as u32;

                #[inline(always)]
                fn read_from(buf: &[u8]) -> Self {
                    let mut bytes = [0u8; size_of::<Self>()];
                    let len = buf.len().min(bytes.len());
                    bytes[..len].copy_from_slice(&buf[..len]);
                    Self::from_le_bytes(bytes)
                }

                #[inline(always)]
                fn write_to(self, buf: &mut [u8]) {
                    let bytes = self.to_le_bytes();
                    let len = buf.len().min(bytes.len());
                    buf[..len].copy_from_slice(&bytes[..len]);
                }
            }
        )*
    };
}

impl_primitive! {
    u8,
    u16,
    u32,
    i8,
    i16,
    i32
}

/// Extension trait for reading and writing [`Primitive`]s at the start of a byte slice.
pub trait PrimitiveRw<P>
where
    P: Primitive,
{
    fn read(&self) -> P;
    fn write(&mut self, value: P);
}

impl<P> PrimitiveRw<P> for [u8]
where
    P: Primitive,
{
    #[inline(always)]
    fn read(&self) -> P {
        P::read_from(self)
    }

    #[inline(always)]
    fn write(&mut self, value: P) {
        value.write_to(self);
    }
}
