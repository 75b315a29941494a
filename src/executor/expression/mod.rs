// Copyright 2025 Wooby Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Compiled Expressions
//
// Resolved expressions are compiled once into straight-line stack programs
// and run by a small VM for every row.
//
//   ┌─────────────┐     ┌──────────────┐     ┌─────────────┐
//   │ Expression  │ ──► │ ExprCompiler │ ──► │   Program   │
//   │ (resolved)  │     │              │     │  (bytecode) │
//   └─────────────┘     └──────────────┘     └─────────────┘
//                                                   │
//                                                   ▼
//   ┌─────────────┐     ┌──────────────┐     ┌─────────────┐
//   │ Output row  │ ◄── │      VM      │ ◄── │   Cursors   │
//   │  / Value    │     │              │     │             │
//   └─────────────┘     └──────────────┘     └─────────────┘

mod compiler;
mod ops;
mod program;
mod vm;

pub use compiler::ExprCompiler;
pub use ops::Op;
pub use program::Program;
pub use vm::{evaluate, execute};

#[cfg(test)]
mod tests;
