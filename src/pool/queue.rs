//! # Cola de Tareas del Pool
//! src/pool/queue.rs
//!
//! Implementa una cola FIFO thread-safe de tareas con apagado ordenado.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};

/// Unidad de trabajo opaca que consume el pool
///
/// El closure es dueño de todo lo que necesita (incluido el socket de la
/// conexión, cuando aplica) y se ejecuta exactamente una vez.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Estado interno protegido por el mutex
///
/// El flag de apagado vive bajo el mismo lock que la cola para que un
/// worker nunca observe "apagado" sin ver también las tareas pendientes.
struct QueueState {
    tasks: VecDeque<Task>,
    shutdown: bool,
}

/// Cola FIFO thread-safe
///
/// El orden de inserción es la única garantía de orden: no hay prioridades
/// ni ordenamiento entre tareas encoladas por threads distintos.
pub struct TaskQueue {
    /// Estado compartido
    state: Arc<Mutex<QueueState>>,

    /// Condvar para notificar cuando hay nuevas tareas
    condvar: Arc<Condvar>,
}

impl TaskQueue {
    /// Crea una cola vacía
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(QueueState {
                tasks: VecDeque::new(),
                shutdown: false,
            })),
            condvar: Arc::new(Condvar::new()),
        }
    }

    /// Encola una tarea al final y despierta a un worker
    ///
    /// Retorna `Err(task)` devolviendo la tarea al caller si el apagado ya
    /// comenzó: después de `shutdown()` la cola no acepta trabajo nuevo.
    pub fn push(&self, task: Task) -> Result<(), Task> {
        let mut state = self.state.lock().unwrap();

        if state.shutdown {
            return Err(task);
        }

        state.tasks.push_back(task);

        // Notificar a workers esperando
        self.condvar.notify_one();

        Ok(())
    }

    /// Desencola la tarea más antigua
    ///
    /// Bloquea hasta que haya una tarea disponible. Retorna `None` solo
    /// cuando el apagado fue solicitado Y la cola quedó vacía: las tareas
    /// ya encoladas se drenan antes de que los workers terminen.
    pub fn pop(&self) -> Option<Task> {
        let mut state = self.state.lock().unwrap();

        loop {
            if let Some(task) = state.tasks.pop_front() {
                return Some(task);
            }

            if state.shutdown {
                return None;
            }

            // Esperar a que haya tareas (los despertares espurios
            // simplemente repiten el chequeo)
            state = self.condvar.wait(state).unwrap();
        }
    }

    /// Intenta desencolar sin bloquear
    ///
    /// Retorna `Some(task)` si hay una tarea, `None` si la cola está vacía
    pub fn try_pop(&self) -> Option<Task> {
        let mut state = self.state.lock().unwrap();
        state.tasks.pop_front()
    }

    /// Marca el apagado y despierta a todos los workers
    ///
    /// Idempotente: llamadas repetidas no tienen efecto adicional.
    pub fn shutdown(&self) {
        let mut state = self.state.lock().unwrap();
        state.shutdown = true;
        self.condvar.notify_all();
    }

    /// Retorna el tamaño actual de la cola
    pub fn len(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.tasks.len()
    }

    /// Verifica si la cola está vacía
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for TaskQueue {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            condvar: Arc::clone(&self.condvar),
        }
    }
}
