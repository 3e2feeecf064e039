//! The fetch-execute loop.
//!
//! One memory array serves as both stack and heap: the stack grows down from
//! `memory_size`, the heap grows up from 0. Registers:
//!
//! | register | role |
//! |---|---|
//! | `ip` | next code address |
//! | `sp` | top of stack (`memory_size` when empty) |
//! | `fp` | current frame |
//! | `hp` | next free heap word |
//! | `ra` | return address |
//! | `tm` | scratch |

use fool_core::{Bytecode, OpCode};

use crate::config::{VmConfig, VmFlags};
use crate::error::VmError;

/// Result of running a program to `halt`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// Values shown by `print`, in order.
    pub printed: Vec<i32>,
    /// Top of stack at `halt`, if the stack was not empty.
    pub stack_top: Option<i32>,
    /// Instructions executed, `halt` included.
    pub steps: u64,
}

/// The virtual machine.
#[derive(Debug)]
pub struct Machine {
    config: VmConfig,
    code: Vec<i32>,
    memory: Vec<i32>,
    ip: usize,
    sp: i32,
    fp: i32,
    hp: i32,
    ra: i32,
    tm: i32,
    printed: Vec<i32>,
    steps: u64,
    halted: bool,
}

/// Run `bytecode` to completion under `config`.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn execute(bytecode: &Bytecode, config: VmConfig) -> Result<Outcome, VmError> {
    Machine::new(bytecode, config)?.run()
}

impl Machine {
    /// Load a program. Fails if it is longer than the configured code size.
    pub fn new(bytecode: &Bytecode, config: VmConfig) -> Result<Self, VmError> {
        if bytecode.len() > config.code_size {
            return Err(VmError::ProgramTooLarge {
                len: bytecode.len(),
                capacity: config.code_size,
            });
        }
        let top = i32::try_from(config.memory_size).unwrap_or(i32::MAX);
        Ok(Self {
            config,
            code: bytecode.code().to_vec(),
            memory: vec![0; config.memory_size],
            ip: 0,
            sp: top,
            fp: top,
            hp: 0,
            ra: 0,
            tm: 0,
            printed: Vec::new(),
            steps: 0,
            halted: false,
        })
    }

    pub fn ip(&self) -> usize {
        self.ip
    }

    pub fn sp(&self) -> i32 {
        self.sp
    }

    pub fn fp(&self) -> i32 {
        self.fp
    }

    pub fn hp(&self) -> i32 {
        self.hp
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn printed(&self) -> &[i32] {
        &self.printed
    }

    /// Word on top of the stack, if any.
    pub fn stack_top(&self) -> Option<i32> {
        let sp = usize::try_from(self.sp).ok()?;
        self.memory.get(sp).copied()
    }

    /// Execute until `halt`.
    pub fn run(mut self) -> Result<Outcome, VmError> {
        log::debug!("running {} words of code", self.code.len());
        while !self.halted {
            self.step()?;
        }
        log::info!(
            "halted after {} steps with {:?} on top of the stack",
            self.steps,
            self.stack_top()
        );
        Ok(Outcome {
            stack_top: self.stack_top(),
            printed: self.printed,
            steps: self.steps,
        })
    }

    // ==========================================================================
    // Memory Access
    // ==========================================================================

    fn cell(&self, address: i32) -> Result<usize, VmError> {
        usize::try_from(address)
            .ok()
            .filter(|a| *a < self.memory.len())
            .ok_or(VmError::MemoryOutOfBounds {
                address: i64::from(address),
                ip: self.ip,
            })
    }

    fn load(&self, address: i32) -> Result<i32, VmError> {
        let cell = self.cell(address)?;
        Ok(self.memory[cell])
    }

    fn store(&mut self, address: i32, value: i32) -> Result<(), VmError> {
        let cell = self.cell(address)?;
        self.memory[cell] = value;
        Ok(())
    }

    fn push(&mut self, value: i32) -> Result<(), VmError> {
        let sp = self.sp - 1;
        self.store(sp, value)?;
        self.sp = sp;
        self.check_collision()
    }

    fn pop(&mut self) -> Result<i32, VmError> {
        let value = self.load(self.sp)?;
        self.sp += 1;
        Ok(value)
    }

    fn check_collision(&self) -> Result<(), VmError> {
        if self.config.flags.contains(VmFlags::CHECK_COLLISION) && self.hp >= self.sp {
            return Err(VmError::HeapStackCollision {
                hp: self.hp,
                sp: self.sp,
                ip: self.ip,
            });
        }
        Ok(())
    }

    // ==========================================================================
    // Execution
    // ==========================================================================

    fn fetch(&mut self) -> Result<i32, VmError> {
        let word = *self.code.get(self.ip).ok_or(VmError::CodeOutOfBounds {
            address: self.ip as i64,
        })?;
        self.ip += 1;
        Ok(word)
    }

    fn jump(&mut self, target: i32) -> Result<(), VmError> {
        self.ip = usize::try_from(target).map_err(|_| VmError::CodeOutOfBounds {
            address: i64::from(target),
        })?;
        Ok(())
    }

    /// Execute one instruction. Does nothing once halted.
    pub fn step(&mut self) -> Result<(), VmError> {
        if self.halted {
            return Ok(());
        }
        if let Some(limit) = self.config.max_steps {
            if self.steps >= limit {
                return Err(VmError::StepLimitExceeded { limit });
            }
        }
        self.steps += 1;

        let at = self.ip;
        let word = self.fetch()?;
        let op = OpCode::try_from(word).map_err(|_| VmError::InvalidOpcode { word, ip: at })?;
        if self.config.flags.contains(VmFlags::TRACE) {
            log::trace!(
                "{at:5}: {} sp={} fp={} hp={} ra={} tm={}",
                op.mnemonic(),
                self.sp,
                self.fp,
                self.hp,
                self.ra,
                self.tm
            );
        }

        match op {
            OpCode::Push => {
                let value = self.fetch()?;
                self.push(value)?;
            }
            OpCode::Pop => {
                self.pop()?;
            }
            OpCode::Add | OpCode::Sub | OpCode::Mult | OpCode::Div => {
                let first = self.pop()?;
                let second = self.pop()?;
                let result = match op {
                    OpCode::Add => second.wrapping_add(first),
                    OpCode::Sub => second.wrapping_sub(first),
                    OpCode::Mult => second.wrapping_mul(first),
                    _ => {
                        if first == 0 {
                            return Err(VmError::DivisionByZero { ip: at });
                        }
                        second.wrapping_div(first)
                    }
                };
                self.push(result)?;
            }
            OpCode::StoreW => {
                let address = self.pop()?;
                let value = self.pop()?;
                self.store(address, value)?;
            }
            OpCode::LoadW => {
                let address = self.pop()?;
                let value = self.load(address)?;
                self.push(value)?;
            }
            OpCode::Branch => {
                let target = self.fetch()?;
                self.jump(target)?;
            }
            OpCode::BranchEq | OpCode::BranchLessEq => {
                let target = self.fetch()?;
                let first = self.pop()?;
                let second = self.pop()?;
                let taken = if op == OpCode::BranchEq {
                    second == first
                } else {
                    second <= first
                };
                if taken {
                    self.jump(target)?;
                }
            }
            OpCode::Js => {
                let target = self.pop()?;
                self.ra = self.ip as i32;
                self.jump(target)?;
            }
            OpCode::StoreRa => self.ra = self.pop()?,
            OpCode::LoadRa => self.push(self.ra)?,
            OpCode::StoreTm => self.tm = self.pop()?,
            OpCode::LoadTm => self.push(self.tm)?,
            OpCode::LoadFp => self.push(self.fp)?,
            OpCode::StoreFp => self.fp = self.pop()?,
            OpCode::CopyFp => self.fp = self.sp,
            OpCode::StoreHp => {
                self.hp = self.pop()?;
                self.check_collision()?;
            }
            OpCode::LoadHp => self.push(self.hp)?,
            OpCode::Print => match self.stack_top() {
                Some(value) => {
                    if self.config.flags.contains(VmFlags::ECHO) {
                        println!("{value}");
                    }
                    self.printed.push(value);
                }
                None => log::warn!("print on an empty stack at instruction {at}"),
            },
            OpCode::Halt => self.halted = true,
        }
        Ok(())
    }
}
