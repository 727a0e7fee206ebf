// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod config_test;
pub mod credential_store_test;
pub mod storage_test;
