// Accumulating collection of fallible iterators
//
//  Copyright (C) 2014-2023 Ryan Specialty, LLC.
//
//  This file is part of Element Core.
//
//  This program is free software: you can redistribute it and/or modify
//  it under the terms of the GNU General Public License as published by
//  the Free Software Foundation, either version 3 of the License, or
//  (at your option) any later version.
//
//  This program is distributed in the hope that it will be useful,
//  but WITHOUT ANY WARRANTY; without even the implied warranty of
//  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//  GNU General Public License for more details.
//
//  You should have received a copy of the GNU General Public License
//  along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! A [`collect`](Iterator::collect) for [`Result`] iterators that does not
//!   stop at the first failure.
//!
//! See the [parent module](super) for more information.

/// An error type that can absorb other errors of the same type.
pub trait Accumulate {
    /// Merge `other` into `self`,
    ///   retaining the order in which errors were produced.
    fn accumulate(&mut self, other: Self);
}

impl<E> Accumulate for Vec<E> {
    fn accumulate(&mut self, other: Self) {
        self.extend(other)
    }
}

/// Augment [`Result`] iterators with a
///   [`collect_all`](CollectAll::collect_all) method,
///     which is analogous to [`Iterator::collect`] but reports every
///     failure.
pub trait CollectAll<T, E: Accumulate>: Iterator<Item = Result<T, E>> {
    /// Consume the entire iterator,
    ///   producing a collection of every [`Ok`] value if there were no
    ///   failures,
    ///     or else every failure accumulated into a single `E`.
    fn collect_all<B: FromIterator<T>>(self) -> Result<B, E>;
}

impl<T, E, I> CollectAll<T, E> for I
where
    E: Accumulate,
    I: Iterator<Item = Result<T, E>>,
{
    fn collect_all<B: FromIterator<T>>(self) -> Result<B, E> {
        let mut oks = Vec::new();
        let mut err: Option<E> = None;

        for result in self {
            match result {
                Ok(x) if err.is_none() => oks.push(x),
                // No need to retain values once we know we will fail.
                Ok(_) => (),
                Err(e) => match err.as_mut() {
                    Some(acc) => acc.accumulate(e),
                    None => err = Some(e),
                },
            }
        }

        match err {
            None => Ok(oks.into_iter().collect()),
            Some(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn collects_when_all_ok() {
        let sut = [Ok::<i32, Vec<&str>>(1), Ok(2), Ok(3)].into_iter();

        assert_eq!(Ok(vec![1, 2, 3]), sut.collect_all::<Vec<_>>());
    }

    #[test]
    fn accumulates_every_failure_in_order() {
        let sut = [Ok(1), Err(vec!["a"]), Ok(2), Err(vec!["b", "c"])];

        assert_eq!(
            Err(vec!["a", "b", "c"]),
            sut.into_iter().collect_all::<Vec<i32>>(),
        );
    }
}
