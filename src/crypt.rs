use aes::{Aes128, Aes256};
use cipher::block_padding::{NoPadding, Pkcs7};
use cipher::generic_array::GenericArray;
use cipher::{BlockDecrypt, BlockDecryptMut, BlockEncryptMut, KeyInit, KeyIvInit};
use md5::{Digest, Md5};
use rc4::{Rc4, StreamCipher};
use sha2::{Sha256, Sha384, Sha512};

use crate::model::{Dict, ObjPtr, Object};
use crate::Error;

const PASSWORD_PAD: [u8; 32] = [
    0x28, 0xBF, 0x4E, 0x5E, 0x4E, 0x75, 0x8A, 0x41, 0x64, 0x00, 0x4E, 0x56, 0xFF, 0xFA, 0x01, 0x08,
    0x2E, 0x2E, 0x00, 0xB6, 0xD0, 0x68, 0x3E, 0x80, 0x2F, 0x0C, 0xA9, 0xFE, 0x64, 0x53, 0x69, 0x7A,
];

/// Standard security handler state: the file encryption key plus the
/// encryption version, which selects RC4 or AES and the object-key rule.
#[derive(Debug, Clone)]
pub(crate) struct Decrypter {
    key: Vec<u8>,
    v: i64,
}

impl Decrypter {
    /// Validates the `/Encrypt` dictionary and password, returning a ready
    /// decrypter. See ISO 32000-2 §7.6.
    pub(crate) fn new(password: &str, encrypt: &Dict, id: &[u8]) -> Result<Decrypter, Error> {
        let n = match encrypt.get("Length").and_then(Object::as_i64) {
            Some(v) => v,
            None => 40,
        };
        let v = encrypt.get("V").and_then(Object::as_i64).unwrap_or(0);
        let r = encrypt.get("R").and_then(Object::as_i64).unwrap_or(0);
        let o = encrypt.get("O").and_then(Object::as_string).unwrap_or(&[]);
        let u = encrypt.get("U").and_then(Object::as_string).unwrap_or(&[]);
        let p = encrypt.get("P").and_then(Object::as_i64).unwrap_or(0) as u32;

        if n % 8 != 0 || n < 40 || (n > 128 && n != 256) {
            return Err(Error::Malformed(format!("{}-bit encryption key", n)));
        }
        if !version_ok(v, encrypt) {
            return Err(Error::Unsupported(format!("encryption version V={}", v)));
        }
        if r < 2 || r == 5 || r > 6 {
            return Err(Error::Malformed(format!("encryption revision R={}", r)));
        }

        let pw = password.as_bytes();
        if r == 6 {
            let ue = encrypt
                .get("UE")
                .and_then(Object::as_string)
                .ok_or_else(|| Error::Malformed("missing /UE".to_string()))?;
            let perms = encrypt.get("Perms").and_then(Object::as_string);
            return Decrypter::new_r6(pw, u, ue, perms);
        }

        if o.len() != 32 || u.len() != 32 {
            return Err(Error::Malformed(
                "missing O= or U= encryption parameters".to_string(),
            ));
        }

        let mut h = Md5::new();
        if pw.len() >= 32 {
            h.update(&pw[..32]);
        } else {
            h.update(pw);
            h.update(&PASSWORD_PAD[..32 - pw.len()]);
        }
        h.update(o);
        h.update(p.to_le_bytes());
        h.update(id);
        let mut key = h.finalize().to_vec();

        let key_len = if r >= 3 {
            let key_len = (n / 8) as usize;
            for _ in 0..50 {
                key = Md5::digest(&key[..key_len]).to_vec();
            }
            key_len
        } else {
            5
        };
        key.truncate(key_len);

        let check = if r == 2 {
            let mut w = PASSWORD_PAD.to_vec();
            rc4_apply(&key, &mut w)?;
            w
        } else {
            let mut h = Md5::new();
            h.update(PASSWORD_PAD);
            h.update(id);
            let mut w = h.finalize().to_vec();
            rc4_apply(&key, &mut w)?;
            for i in 1..=19u8 {
                let xored: Vec<u8> = key.iter().map(|b| b ^ i).collect();
                rc4_apply(&xored, &mut w)?;
            }
            w
        };
        if !u.starts_with(&check) {
            return Err(Error::InvalidPassword);
        }

        Ok(Decrypter { key, v })
    }

    /// Revision 6 (AES-256) validation and key recovery, ISO 32000-2
    /// Algorithm 2.A with the 2.B hash.
    fn new_r6(
        password: &[u8],
        u: &[u8],
        ue: &[u8],
        perms: Option<&[u8]>,
    ) -> Result<Decrypter, Error> {
        let password = &password[..password.len().min(127)];
        if u.len() < 48 {
            return Err(Error::Malformed(format!("bad R6 U length {}", u.len())));
        }
        let u = &u[..48];

        if hash_r6(password, &u[32..40]) != u[..32] {
            return Err(Error::InvalidPassword);
        }

        let intermediate = hash_r6(password, &u[40..48]);
        if ue.len() < 32 {
            return Err(Error::Malformed(format!("bad R6 UE length {}", ue.len())));
        }
        let mut key = ue[..32].to_vec();
        let cbc = cbc::Decryptor::<Aes256>::new_from_slices(&intermediate, &[0u8; 16])
            .map_err(|_| Error::Malformed("bad R6 intermediate key".to_string()))?;
        cbc.decrypt_padded_mut::<NoPadding>(&mut key)
            .map_err(|_| Error::Malformed("bad R6 UE payload".to_string()))?;

        if let Some(perms) = perms {
            if perms.len() < 16 {
                return Err(Error::Malformed("bad R6 Perms length".to_string()));
            }
            let cipher = Aes256::new_from_slice(&key)
                .map_err(|_| Error::Malformed("bad R6 file key".to_string()))?;
            let mut block = [0u8; 16];
            block.copy_from_slice(&perms[..16]);
            cipher.decrypt_block(GenericArray::from_mut_slice(&mut block));
            if &block[9..12] != b"adb" {
                return Err(Error::Malformed("Perms did not validate".to_string()));
            }
        }

        Ok(Decrypter { key, v: 5 })
    }

    fn aes(&self) -> bool {
        self.v == 4 || self.v == 5
    }

    fn crypt_key(&self, ptr: ObjPtr) -> Vec<u8> {
        if self.v == 5 {
            return self.key.clone();
        }
        let mut h = Md5::new();
        h.update(&self.key);
        h.update([
            ptr.id as u8,
            (ptr.id >> 8) as u8,
            (ptr.id >> 16) as u8,
            ptr.gen as u8,
            (ptr.gen >> 8) as u8,
        ]);
        if self.v == 4 {
            h.update(b"sAlT");
        }
        let mut key = h.finalize().to_vec();
        key.truncate((self.key.len() + 5).min(16));
        key
    }

    /// Decrypts one string or stream body belonging to the object `ptr`.
    pub(crate) fn decrypt(&self, ptr: ObjPtr, data: &[u8]) -> Result<Vec<u8>, Error> {
        let key = self.crypt_key(ptr);
        if !self.aes() {
            let mut out = data.to_vec();
            rc4_apply(&key, &mut out)?;
            return Ok(out);
        }

        if data.len() < 16 || (data.len() - 16) % 16 != 0 {
            return Err(Error::Malformed("bad AES payload length".to_string()));
        }
        let (iv, body) = data.split_at(16);
        let mut out = body.to_vec();
        let plain_len = if self.v == 5 {
            let cbc = cbc::Decryptor::<Aes256>::new_from_slices(&key, iv)
                .map_err(|_| Error::Malformed("bad AES key".to_string()))?;
            cbc.decrypt_padded_mut::<Pkcs7>(&mut out)
                .map_err(|_| Error::Malformed("bad AES padding".to_string()))?
                .len()
        } else {
            let cbc = cbc::Decryptor::<Aes128>::new_from_slices(&key, iv)
                .map_err(|_| Error::Malformed("bad AES key".to_string()))?;
            cbc.decrypt_padded_mut::<Pkcs7>(&mut out)
                .map_err(|_| Error::Malformed("bad AES padding".to_string()))?
                .len()
        };
        out.truncate(plain_len);
        Ok(out)
    }
}

/// Algorithm 2.B: the iterated SHA-2/AES password hash.
fn hash_r6(p: &[u8], salt: &[u8]) -> Vec<u8> {
    let mut h = Sha256::new();
    h.update(p);
    h.update(salt);
    let mut k = h.finalize().to_vec();

    let mut i = 1u32;
    loop {
        let mut round = Vec::with_capacity(p.len() + k.len());
        round.extend_from_slice(p);
        round.extend_from_slice(&k);
        let mut e = round.repeat(64);

        // k is at least 32 bytes, so k1 always fills whole AES blocks.
        if let Ok(cbc) = cbc::Encryptor::<Aes128>::new_from_slices(&k[..16], &k[16..32]) {
            let len = e.len();
            if cbc.encrypt_padded_mut::<NoPadding>(&mut e, len).is_err() {
                break;
            }
        } else {
            break;
        }

        let m: u32 = e[..16].iter().map(|&b| u32::from(b)).sum();
        k = match m % 3 {
            0 => Sha256::digest(&e).to_vec(),
            1 => Sha384::digest(&e).to_vec(),
            _ => Sha512::digest(&e).to_vec(),
        };

        let last = e.last().copied().unwrap_or(0);
        if i >= 64 && u32::from(last) <= i - 32 {
            break;
        }
        i += 1;
    }

    k.truncate(32);
    k
}

pub(crate) fn rc4_apply(key: &[u8], data: &mut [u8]) -> Result<(), Error> {
    fn run<K>(key: &[u8], data: &mut [u8]) -> Result<(), Error>
    where
        Rc4<K>: KeyInit + StreamCipher,
    {
        let mut cipher = Rc4::<K>::new_from_slice(key)
            .map_err(|_| Error::Malformed("invalid RC4 key".to_string()))?;
        cipher.apply_keystream(data);
        Ok(())
    }

    match key.len() {
        1 => run::<rc4::consts::U1>(key, data),
        2 => run::<rc4::consts::U2>(key, data),
        3 => run::<rc4::consts::U3>(key, data),
        4 => run::<rc4::consts::U4>(key, data),
        5 => run::<rc4::consts::U5>(key, data),
        6 => run::<rc4::consts::U6>(key, data),
        7 => run::<rc4::consts::U7>(key, data),
        8 => run::<rc4::consts::U8>(key, data),
        9 => run::<rc4::consts::U9>(key, data),
        10 => run::<rc4::consts::U10>(key, data),
        11 => run::<rc4::consts::U11>(key, data),
        12 => run::<rc4::consts::U12>(key, data),
        13 => run::<rc4::consts::U13>(key, data),
        14 => run::<rc4::consts::U14>(key, data),
        15 => run::<rc4::consts::U15>(key, data),
        16 => run::<rc4::consts::U16>(key, data),
        n => Err(Error::Malformed(format!("unsupported RC4 key length {}", n))),
    }
}

fn version_ok(v: i64, encrypt: &Dict) -> bool {
    match v {
        1 | 2 => return true,
        4 | 5 => {}
        _ => return false,
    }

    let cf = match encrypt.get("CF").and_then(Object::as_dict) {
        Some(cf) => cf,
        None => return false,
    };
    let stmf = match encrypt.get("StmF").and_then(Object::as_name) {
        Some(name) => name,
        None => return false,
    };
    let strf = match encrypt.get("StrF").and_then(Object::as_name) {
        Some(name) => name,
        None => return false,
    };
    if stmf != strf {
        return false;
    }
    let params = match cf.get(stmf).and_then(Object::as_dict) {
        Some(params) => params,
        None => return false,
    };
    match params.get("AuthEvent").and_then(Object::as_name) {
        None | Some("DocOpen") => {}
        Some(_) => return false,
    }

    let (want_len, want_cfm) = if v == 5 { (32, "AESV3") } else { (16, "AESV2") };
    match params.get("Length").and_then(Object::as_i64) {
        None => {}
        Some(len) if len == want_len => {}
        Some(_) => return false,
    }
    params.get("CFM").and_then(Object::as_name) == Some(want_cfm)
}
