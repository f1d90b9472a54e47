// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of NOVA.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

//! Backend routes consumed by the client

pub const STATUS: &str = "/status";
pub const LIGHT_CONTROL: &str = "/control/light";
pub const REMOTE_CONTROL: &str = "/control/firestick";
pub const CHAT_SEND: &str = "/chat/send";
pub const TTS_SPEAK: &str = "/tts/speak";
