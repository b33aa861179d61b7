// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod book;

pub use book::{Author, Book, BookRecord, BooksPage, Cover};
