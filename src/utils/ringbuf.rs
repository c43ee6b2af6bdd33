//! 定长环形缓冲区，写满后覆盖最旧的元素

#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    buf: Vec<T>,
    /// 下一次写入的位置
    head: usize,
    len: usize,
}

impl<T: Copy + Default> RingBuffer<T> {
    /// 容量为 0 时按 1 处理
    pub fn new(capacity: usize) -> Self {
        RingBuffer {
            buf: vec![T::default(); capacity.max(1)],
            head: 0,
            len: 0,
        }
    }

    pub fn push_overwrite(&mut self, item: T) {
        self.buf[self.head] = item;
        self.head = (self.head + 1) % self.buf.len();
        if self.len < self.buf.len() {
            self.len += 1;
        }
    }

    /// 从旧到新遍历
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        let cap = self.buf.len();
        let start = (self.head + cap - self.len) % cap;
        (0..self.len).map(move |i| &self.buf[(start + i) % cap])
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let rb: RingBuffer<u8> = RingBuffer::new(10);
        assert_eq!(rb.capacity(), 10);
        assert!(rb.is_empty());
        assert_eq!(RingBuffer::<u8>::new(0).capacity(), 1);
    }

    #[test]
    fn test_iter_before_wrap() {
        let mut rb = RingBuffer::new(4);
        rb.push_overwrite(1);
        rb.push_overwrite(2);
        assert_eq!(rb.iter().copied().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(rb.len(), 2);
    }

    #[test]
    fn test_overwrite_keeps_newest() {
        let mut rb = RingBuffer::new(3);
        for i in 1..=5 {
            rb.push_overwrite(i);
        }
        assert_eq!(rb.len(), 3);
        assert_eq!(rb.iter().copied().collect::<Vec<_>>(), vec![3, 4, 5]);
    }
}
