#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let r = RingBuffer::new(16);
        assert_eq!(16, r.len());
        assert_eq!(15, r.mask());
        assert_eq!(0.0, r.get(3));
    }

    #[test]
    #[should_panic]
    fn test_size_must_be_power_of_two() {
        RingBuffer::new(1000);
    }

    #[test]
    fn test_wrap() {
        let mut r = RingBuffer::new(8);
        for i in 0..20usize {
            r.write(i, i as f32);
        }

        // cursor 19 wrote to slot 3, and 12..=19 are the last 8 values
        assert_eq!(19.0, r.get(19));
        assert_eq!(19.0, r.get(3));
        assert_eq!(12.0, r.get(4));
    }

    #[test]
    fn test_delayed() {
        let mut r = RingBuffer::new(8);
        for i in 0..10usize {
            r.write(i, i as f32);
        }

        assert_eq!(9.0, r.delayed(9, 0));
        assert_eq!(8.0, r.delayed(9, 1));
        assert_eq!(2.0, r.delayed(9, 7));
        // delays are taken modulo the size, like the bitwise-and in the filter
        assert_eq!(9.0, r.delayed(9, 8));
        assert_eq!(8.0, r.delayed(9, 9));
        // negative delays wrap through two's complement
        assert_eq!(2.0, r.delayed(9, -1));
    }

    #[test]
    fn test_delayed_at_cursor_zero() {
        let mut r = RingBuffer::new(4);
        r.write(0, 1.0);
        assert_eq!(1.0, r.delayed(0, 0));
        assert_eq!(0.0, r.delayed(0, 1));
    }
}

/// Fixed-size circular buffer of samples indexed by an ever-increasing cursor.
/// The size is a power of two and positions wrap with a bitwise and, matching
/// the index arithmetic of the pitch shifter.
pub struct RingBuffer {
    data: Box<[f32]>,
    mask: usize,
}

impl RingBuffer {
    pub fn new(size: usize) -> RingBuffer {
        assert!(size.is_power_of_two(), "ring buffer size must be a power of 2");
        RingBuffer {
            data: vec![0f32; size].into_boxed_slice(),
            mask: size - 1,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn mask(&self) -> usize {
        self.mask
    }

    #[inline]
    pub fn write(&mut self, cursor: usize, v: f32) {
        self.data[cursor & self.mask] = v;
    }

    #[inline]
    pub fn get(&self, cursor: usize) -> f32 {
        self.data[cursor & self.mask]
    }

    /// The sample written `delay` positions before `cursor`. The delay itself
    /// is first wrapped to the buffer size.
    #[inline]
    pub fn delayed(&self, cursor: usize, delay: i32) -> f32 {
        let delay = (delay as usize) & self.mask;
        self.data[cursor.wrapping_sub(delay) & self.mask]
    }
}
