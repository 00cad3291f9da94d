use std::os::raw::c_char;

use rascaline::Error;

/// Copy the string in `data` into the C buffer `buffer` of size `bufflen`,
/// adding a NULL terminator. If the buffer is too small for the string and
/// the terminator, nothing is written and an error is returned.
pub unsafe fn copy_str_to_c(data: &str, buffer: *mut c_char, bufflen: usize) -> Result<(), Error> {
    let bytes = data.as_bytes();
    if bytes.len() + 1 > bufflen {
        return Err(Error::InvalidParameter(format!(
            "string buffer is not big enough: got space for {} characters, need {}",
            bufflen, bytes.len() + 1,
        )));
    }

    std::ptr::copy_nonoverlapping(bytes.as_ptr().cast::<c_char>(), buffer, bytes.len());
    buffer.add(bytes.len()).write(0);

    Ok(())
}
