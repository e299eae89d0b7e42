//! # Pool de Workers
//!
//! Un conjunto fijo de threads de larga vida que consumen tareas de una
//! cola FIFO compartida. El pool no sabe nada de sockets ni de HTTP: las
//! tareas son closures opacos que llegan del event loop con todo lo que
//! necesitan adentro.
//!
//! ## Ciclo de vida
//!
//! 1. `ThreadPool::new(n)` lanza los `n` workers; cada uno bloquea en
//!    `TaskQueue::pop()` hasta que haya trabajo.
//! 2. `execute()` encola una tarea y despierta exactamente a un worker.
//! 3. `shutdown()` (también desde `Drop`) marca el apagado, drena las
//!    tareas pendientes y hace join de cada thread.
//!
//! Un pánico dentro de una tarea queda aislado: el worker lo captura,
//! lo reporta y sigue atendiendo la cola.

pub mod queue;

pub use queue::{Task, TaskQueue};

use std::panic::{self, AssertUnwindSafe};
use std::thread;

/// Un thread del pool
///
/// El handle vive en un `Option` para poder hacer join desde `shutdown()`
/// sin mover el `Worker`.
struct Worker {
    id: usize,
    thread: Option<thread::JoinHandle<()>>,
}

impl Worker {
    /// Lanza el thread del worker
    fn spawn(id: usize, queue: TaskQueue) -> Self {
        let thread = thread::spawn(move || {
            println!("🔧 Worker {} started", id);

            // None = apagado solicitado y cola drenada
            while let Some(task) = queue.pop() {
                let result = panic::catch_unwind(AssertUnwindSafe(|| task()));
                if result.is_err() {
                    eprintln!("❌ Worker {}: una tarea terminó en pánico", id);
                }
            }
        });

        Self {
            id,
            thread: Some(thread),
        }
    }
}

/// Pool de workers de tamaño fijo sobre una cola FIFO
pub struct ThreadPool {
    workers: Vec<Worker>,
    queue: TaskQueue,
}

impl ThreadPool {
    /// Crea el pool y lanza `size` workers
    ///
    /// # Ejemplo
    /// ```
    /// use reactor_server::pool::ThreadPool;
    ///
    /// let pool = ThreadPool::new(2);
    /// assert_eq!(pool.size(), 2);
    /// ```
    pub fn new(size: usize) -> Self {
        let queue = TaskQueue::new();

        let workers = (0..size)
            .map(|id| Worker::spawn(id, queue.clone()))
            .collect();

        println!("[+] Pool de workers iniciado ({} threads)", size);

        Self { workers, queue }
    }

    /// Encola una tarea para que la ejecute algún worker
    ///
    /// Retorna `Err` con la tarea (sin ejecutar) si el pool ya está en
    /// apagado; el caller decide qué hacer con ella.
    pub fn execute<F>(&self, f: F) -> Result<(), Task>
    where
        F: FnOnce() + Send + 'static,
    {
        self.queue.push(Box::new(f))
    }

    /// Número de workers del pool
    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Tareas encoladas que todavía no tomó ningún worker
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Apaga el pool: drena la cola y hace join de todos los workers
    ///
    /// Las tareas ya encoladas terminan de ejecutarse; las que lleguen
    /// después del apagado se rechazan en `execute()`. Idempotente.
    pub fn shutdown(&mut self) {
        self.queue.shutdown();

        for worker in &mut self.workers {
            if let Some(thread) = worker.thread.take() {
                if thread.join().is_err() {
                    eprintln!("❌ Worker {} terminó con pánico", worker.id);
                }
            }
        }
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}
