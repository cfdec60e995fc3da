//! 多生产者单消费者预留队列（MPSC Reservation Queue）
//!
//! 每个ticker的买/卖两侧各持有一个该队列：
//! - 预分配固定容量，零动态分配
//! - 无锁设计：只使用原子计数器 + 有界自旋
//! - 两阶段发布：先预留槽位（reserve），再按预留顺序提交（commit）
//!
//! # 计数器
//!
//! ```text
//!   head ──────────► tail ──────────► reserved
//!   │ 已提交，待消费 │ 已预留，写入中 │
//! ```
//!
//! 三个计数器都是逻辑上无界、按 `wrapping` 运算的索引，
//! 槽位下标为 `index & mask`。始终满足 `head <= tail <= reserved`。
//!
//! # 内存序
//!
//! - 生产者写槽位后以 Release 写 `tail`；消费者以 Acquire 读 `tail`，
//!   因此看到新 `tail` 的消费者一定能看到完整写入的值。
//! - 消费者读完槽位后以 Release 写 `head`；生产者以 Acquire 读 `head`，
//!   因此生产者只会覆盖已被读走的槽位。

use crossbeam::utils::{Backoff, CachePadded};
use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// 预留队列
pub struct ReservationQueue<T> {
    /// 槽位存储（预分配）
    slots: Box<[UnsafeCell<MaybeUninit<T>>]>,

    /// `capacity - 1`，容量必须是2的幂
    mask: usize,

    /// 消费者读取位置
    head: CachePadded<AtomicUsize>,

    /// 已提交位置（消费者可见的上界）
    tail: CachePadded<AtomicUsize>,

    /// 已预留位置
    reserved: CachePadded<AtomicUsize>,

    /// 消费者角色是否已被占用
    consumer_claimed: AtomicBool,
}

// 安全性：槽位只由预留它的生产者写、由唯一的消费者读，
// 所有跨线程的可见性都由 head/tail 的 Acquire/Release 建立。
unsafe impl<T: Send> Send for ReservationQueue<T> {}
unsafe impl<T: Send> Sync for ReservationQueue<T> {}

impl<T> ReservationQueue<T> {
    /// 创建指定容量的队列
    ///
    /// # 参数
    /// - `capacity`: 最大容量（必须是2的幂次方）
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "Capacity must be greater than 0");
        assert!(
            capacity.is_power_of_two(),
            "Capacity must be a power of two, got {}",
            capacity
        );

        let slots = (0..capacity)
            .map(|_| UnsafeCell::new(MaybeUninit::uninit()))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Self {
            slots,
            mask: capacity - 1,
            head: CachePadded::new(AtomicUsize::new(0)),
            tail: CachePadded::new(AtomicUsize::new(0)),
            reserved: CachePadded::new(AtomicUsize::new(0)),
            consumer_claimed: AtomicBool::new(false),
        }
    }

    /// 预留并发布一个值
    ///
    /// # 返回
    /// - `Ok(())`: 已提交，消费者可见
    /// - `Err(value)`: 队列已满，原值返回，队列状态不变
    ///
    /// 提交严格按预留顺序进行：若前面的生产者尚未提交，
    /// 当前线程会自旋（随后让出CPU）直到轮到自己。
    pub fn try_publish(&self, value: T) -> Result<(), T> {
        let pos = match self.reserve() {
            Some(pos) => pos,
            None => return Err(value),
        };

        unsafe {
            // 安全性：pos 已被本线程独占预留，消费者在 tail 越过 pos 之前不会读它
            (*self.slots[pos & self.mask].get()).write(value);
        }

        // 等待所有更小的预留完成提交
        let backoff = Backoff::new();
        while self.tail.load(Ordering::Acquire) != pos {
            backoff.snooze();
        }
        self.tail.store(pos.wrapping_add(1), Ordering::Release);

        Ok(())
    }

    /// 预留一个槽位，队列满时返回 `None`
    #[inline]
    fn reserve(&self) -> Option<usize> {
        let backoff = Backoff::new();
        loop {
            // 先读 head 再读 reserved，保证 reserved - head 不会下溢
            let head = self.head.load(Ordering::Acquire);
            let pos = self.reserved.load(Ordering::Acquire);

            if pos.wrapping_sub(head) >= self.capacity() {
                // 消费者刚好释放了槽位时重试，否则确实已满
                if self.head.load(Ordering::Acquire) == head {
                    return None;
                }
                continue;
            }

            if self
                .reserved
                .compare_exchange_weak(
                    pos,
                    pos.wrapping_add(1),
                    Ordering::AcqRel,
                    Ordering::Relaxed,
                )
                .is_ok()
            {
                return Some(pos);
            }
            backoff.spin();
        }
    }

    /// 占用消费者角色
    ///
    /// 非阻塞：若已有消费者存在则返回 `None`。
    /// 返回的守卫在 drop 时释放消费者角色。
    pub fn consumer(&self) -> Option<Consumer<'_, T>> {
        self.consumer_claimed
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| Consumer { queue: self })
    }

    /// 已提交但未消费的元素数量（并发下为近似值）
    #[inline]
    pub fn len(&self) -> usize {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        tail.wrapping_sub(head).min(self.capacity())
    }

    /// 检查是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 获取容量
    #[inline]
    pub fn capacity(&self) -> usize {
        self.mask + 1
    }

    /// 消费者出队（只能由持有 `Consumer` 守卫的线程调用）
    #[inline]
    fn pop(&self) -> Option<T> {
        // 只有消费者会修改 head，Relaxed 足够
        let head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Acquire);
        if head == tail {
            return None;
        }

        let value = unsafe {
            // 安全性：tail 已越过 head，该槽位已被完整写入且尚未被读走
            (*self.slots[head & self.mask].get()).assume_init_read()
        };

        self.head.store(head.wrapping_add(1), Ordering::Release);
        Some(value)
    }
}

impl<T> Drop for ReservationQueue<T> {
    fn drop(&mut self) {
        // &mut self 保证没有并发的生产者或消费者
        let head = *self.head.get_mut();
        let tail = *self.tail.get_mut();
        let mut idx = head;
        while idx != tail {
            unsafe {
                self.slots[idx & self.mask].get_mut().assume_init_drop();
            }
            idx = idx.wrapping_add(1);
        }
    }
}

/// 消费者守卫
///
/// 同一时刻每个队列最多存在一个 `Consumer`。
pub struct Consumer<'a, T> {
    queue: &'a ReservationQueue<T>,
}

impl<'a, T> Consumer<'a, T> {
    /// 出队
    ///
    /// # 返回
    /// - `Some(value)`: 成功出队
    /// - `None`: 队列为空（从不阻塞）
    #[inline]
    pub fn pop(&mut self) -> Option<T> {
        self.queue.pop()
    }

    /// 最多取出 `limit` 个元素
    pub fn drain(&mut self, limit: usize) -> Drain<'_, 'a, T> {
        Drain {
            consumer: self,
            remaining: limit,
        }
    }

    /// 所属队列
    #[inline]
    pub fn queue(&self) -> &'a ReservationQueue<T> {
        self.queue
    }
}

impl<'a, T> Drop for Consumer<'a, T> {
    fn drop(&mut self) {
        self.queue.consumer_claimed.store(false, Ordering::Release);
    }
}

/// 有界消耗迭代器
pub struct Drain<'c, 'a, T> {
    consumer: &'c mut Consumer<'a, T>,
    remaining: usize,
}

impl<'c, 'a, T> Iterator for Drain<'c, 'a, T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let value = self.consumer.pop()?;
        self.remaining -= 1;
        Some(value)
    }
}
